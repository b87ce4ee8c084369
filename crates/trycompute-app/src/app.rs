//! Application lifecycle: load, update, render, key-down, close.
//!
//! [`TryCompute`] owns the [`GpuContext`] and enforces the call order the
//! window loop must follow. Rendering before load or after close is an
//! error; close may be requested any number of times.

use anyhow::{bail, Result};
use tracing::{debug, info, trace};
use trycompute_core::inputs::{action_for, InputAction, KeyDown};
use trycompute_core::AppConfig;
use trycompute_gpu::{FrameStats, GpuContext, GraphicsApi};

/// Where the application is in its lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Lifecycle {
    Created,
    Loaded,
    Closed,
}

/// Control directive returned by input callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// The window should close.
    Exit,
}

#[derive(Debug)]
pub struct TryCompute {
    config: AppConfig,
    lifecycle: Lifecycle,
    gpu: Option<GpuContext>,
    frames: u64,
}

impl TryCompute {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Created,
            gpu: None,
            frames: 0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn gpu(&self) -> Option<&GpuContext> {
        self.gpu.as_ref()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Create every GPU object. Shader problems are logged, not returned.
    pub fn on_load<A>(&mut self, api: &mut A) -> Result<()>
    where
        A: GraphicsApi + ?Sized,
    {
        if self.lifecycle != Lifecycle::Created {
            bail!("on_load called in state {:?}", self.lifecycle);
        }

        let gpu = GpuContext::setup(api, self.config.texture);
        let failures = gpu.diagnostics().filter(|d| d.is_failure()).count();
        if failures > 0 {
            info!("setup finished with {failures} shader error(s); rendering continues");
        }

        self.gpu = Some(gpu);
        self.lifecycle = Lifecycle::Loaded;
        Ok(())
    }

    /// Per-frame simulation hook. The demo has nothing to simulate.
    pub fn on_update(&mut self, dt: f32) {
        trace!(dt, "update");
    }

    pub fn on_render<A>(&mut self, api: &mut A, dt: f32) -> Result<FrameStats>
    where
        A: GraphicsApi + ?Sized,
    {
        let gpu = match (self.lifecycle, self.gpu.as_ref()) {
            (Lifecycle::Loaded, Some(gpu)) => gpu,
            (state, _) => bail!("on_render called in state {state:?}"),
        };

        let Some(stats) = gpu.render_frame(api) else {
            bail!("GPU context already released");
        };

        self.frames += 1;
        trace!(frame = self.frames, dt, ?stats.work_groups, "rendered");
        Ok(stats)
    }

    pub fn on_key_down(&mut self, event: KeyDown) -> AppControl {
        match action_for(event) {
            Some(InputAction::CloseWindow) => {
                debug!(?event.key, "close requested");
                AppControl::Exit
            }
            None => AppControl::Continue,
        }
    }

    /// Release GPU objects. Returns whether this call released anything.
    pub fn on_close<A>(&mut self, api: &mut A) -> bool
    where
        A: GraphicsApi + ?Sized,
    {
        let released = match self.gpu.as_mut() {
            Some(gpu) => gpu.teardown(api),
            None => false,
        };

        if self.lifecycle != Lifecycle::Closed {
            info!(frames = self.frames, "closing");
            self.lifecycle = Lifecycle::Closed;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trycompute_core::inputs::Key;
    use trycompute_core::shaders::FLAT_BLUE;
    use trycompute_gpu::software::{Call, ObjectKind};
    use trycompute_gpu::SoftwareDevice;

    fn loaded() -> (SoftwareDevice, TryCompute) {
        let mut dev = SoftwareDevice::new();
        let mut app = TryCompute::new(AppConfig::default());
        app.on_load(&mut dev).unwrap();
        (dev, app)
    }

    #[test]
    fn starts_created_and_loads_once() {
        let mut dev = SoftwareDevice::new();
        let mut app = TryCompute::new(AppConfig::default());
        assert_eq!(app.lifecycle(), Lifecycle::Created);

        app.on_load(&mut dev).unwrap();
        assert_eq!(app.lifecycle(), Lifecycle::Loaded);
        assert!(app.on_load(&mut dev).is_err());
        assert_eq!(dev.live_object_count(), 6);
    }

    #[test]
    fn render_before_load_is_rejected() {
        let mut dev = SoftwareDevice::new();
        let mut app = TryCompute::new(AppConfig::default());
        assert!(app.on_render(&mut dev, 0.016).is_err());
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn render_after_close_is_rejected() {
        let (mut dev, mut app) = loaded();
        app.on_close(&mut dev);
        assert!(app.on_render(&mut dev, 0.016).is_err());
    }

    #[test]
    fn every_frame_dispatches_once_and_draws_once() {
        let (mut dev, mut app) = loaded();
        dev.clear_calls();

        for _ in 0..5 {
            app.on_update(0.016);
            app.on_render(&mut dev, 0.016).unwrap();
        }

        let dispatches = dev
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::DispatchCompute(_)))
            .count();
        assert_eq!(dispatches, 5);
        assert_eq!(dev.draws().len(), 5);
        assert_eq!(app.frames(), 5);
    }

    #[test]
    fn rendered_quad_is_uniformly_blue() {
        let (mut dev, mut app) = loaded();
        app.on_render(&mut dev, 0.0).unwrap();
        assert_eq!(dev.draws()[0].uniform_color, Some(FLAT_BLUE));
    }

    #[test]
    fn escape_requests_exit_once_per_press() {
        let (_, mut app) = loaded();
        assert_eq!(app.on_key_down(KeyDown::new(Key::Escape)), AppControl::Exit);
        assert_eq!(
            app.on_key_down(KeyDown::repeated(Key::Escape)),
            AppControl::Continue
        );
        assert_eq!(app.on_key_down(KeyDown::new(Key::Escape)), AppControl::Exit);
    }

    #[test]
    fn other_keys_have_no_effect() {
        let (dev, mut app) = loaded();
        let before = dev.calls().len();
        for code in [13, 32, 65, 90] {
            assert_eq!(
                app.on_key_down(KeyDown::new(Key::Other(code))),
                AppControl::Continue
            );
        }
        assert_eq!(app.lifecycle(), Lifecycle::Loaded);
        assert_eq!(dev.calls().len(), before);
    }

    #[test]
    fn close_is_idempotent() {
        let (mut dev, mut app) = loaded();
        let gpu_names = {
            let gpu = app.gpu().unwrap();
            [
                gpu.vertex_buffer().name(),
                gpu.index_buffer().name(),
                gpu.vertex_array(),
                gpu.raster_pipeline().program(),
            ]
        };

        assert!(app.on_close(&mut dev));
        assert!(!app.on_close(&mut dev));
        assert_eq!(app.lifecycle(), Lifecycle::Closed);

        for name in gpu_names {
            assert_eq!(dev.deletions_of(name), 1);
        }
        assert_eq!(dev.live_count(ObjectKind::Program), 0);
        assert_eq!(dev.live_count(ObjectKind::Texture), 0);
    }

    #[test]
    fn close_before_load_releases_nothing() {
        let mut dev = SoftwareDevice::new();
        let mut app = TryCompute::new(AppConfig::default());
        assert!(!app.on_close(&mut dev));
        assert_eq!(app.lifecycle(), Lifecycle::Closed);
        assert!(app.on_load(&mut dev).is_err());
    }
}
