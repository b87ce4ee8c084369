use anyhow::Result;
use tracing::{info, warn};
use trycompute_core::logging::init_logging;
use trycompute_core::AppConfig;

mod app;
mod runtime;
mod time;

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(config.log_filter.as_deref());

    for rejected in &config.rejected_overrides {
        warn!("{rejected}");
    }

    info!(
        title = %config.window.title,
        width = config.window.width,
        height = config.window.height,
        texture = ?(config.texture.width, config.texture.height),
        "starting"
    );

    runtime::Runtime::run(config)
}
