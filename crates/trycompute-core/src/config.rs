//! Application configuration.
//!
//! Defaults reproduce the fixed constants of the demo: an 800x600 window and
//! a 512x512 compute target. A couple of environment overrides exist for
//! experimentation; malformed values are ignored and kept in
//! [`AppConfig::rejected_overrides`] for the caller to report once logging is
//! up.

use anyhow::{anyhow, Context, Result};

/// Environment variable overriding the compute target size, as `WxH`.
pub const TEXTURE_SIZE_ENV: &str = "TRYCOMPUTE_TEXTURE_SIZE";

/// Environment variable overriding the log filter (`EnvFilter` syntax).
pub const LOG_FILTER_ENV: &str = "TRYCOMPUTE_LOG";

/// Largest accepted texture side. Matches the `GL_MAX_TEXTURE_SIZE` of common
/// desktop drivers and keeps sizes well inside `GLsizei`.
pub const MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL with Silk.NET".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Dimensions of the image written by the compute shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

/// Top-level configuration handed to the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub texture: TextureConfig,
    /// Log filter handed to `init_logging`. When unset, `RUST_LOG` and then
    /// `info` apply.
    pub log_filter: Option<String>,
    /// Overrides that were present but invalid, one message each.
    pub rejected_overrides: Vec<String>,
}

impl AppConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Kept separate from [`AppConfig::from_env`] so tests don't have to mutate
    /// the process environment.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(TEXTURE_SIZE_ENV) {
            match parse_texture_size(&raw) {
                Ok(texture) => self.texture = texture,
                Err(e) => self
                    .rejected_overrides
                    .push(format!("ignoring {TEXTURE_SIZE_ENV}={raw:?}: {e:#}")),
            }
        }

        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                self.log_filter = Some(filter);
            }
        }

        self
    }
}

/// Parse a `WxH` size such as `512x512`. Both sides must be in
/// `1..=MAX_TEXTURE_DIMENSION`.
pub fn parse_texture_size(raw: &str) -> Result<TextureConfig> {
    let (w, h) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT"))?;

    let width: u32 = w.trim().parse().context("invalid width")?;
    let height: u32 = h.trim().parse().context("invalid height")?;

    if width == 0 || height == 0 {
        return Err(anyhow!("texture dimensions must be non-zero"));
    }
    if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
        return Err(anyhow!(
            "texture dimensions must not exceed {MAX_TEXTURE_DIMENSION}"
        ));
    }

    Ok(TextureConfig { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_demo_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.window.title, "LearnOpenGL with Silk.NET");
        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
        assert_eq!(cfg.texture, TextureConfig { width: 512, height: 512 });
        assert_eq!(cfg.log_filter, None);
        assert!(cfg.rejected_overrides.is_empty());
    }

    #[test]
    fn texture_size_override_applies() {
        let cfg = AppConfig::default().with_overrides(lookup(&[(TEXTURE_SIZE_ENV, "256x128")]));
        assert_eq!(cfg.texture, TextureConfig { width: 256, height: 128 });
    }

    #[test]
    fn malformed_texture_size_is_ignored() {
        let cfg = AppConfig::default().with_overrides(lookup(&[(TEXTURE_SIZE_ENV, "big")]));
        assert_eq!(cfg.texture, TextureConfig::default());
        assert_eq!(cfg.rejected_overrides.len(), 1);
        assert!(cfg.rejected_overrides[0].contains(TEXTURE_SIZE_ENV));
    }

    #[test]
    fn oversized_texture_size_is_rejected() {
        assert!(parse_texture_size("16384x16384").is_ok());
        assert!(parse_texture_size("16385x16").is_err());
        assert!(parse_texture_size("16x4294967295").is_err());

        let cfg = AppConfig::default()
            .with_overrides(lookup(&[(TEXTURE_SIZE_ENV, "3000000000x2")]));
        assert_eq!(cfg.texture, TextureConfig::default());
        assert_eq!(cfg.rejected_overrides.len(), 1);
    }

    #[test]
    fn zero_texture_size_is_rejected() {
        assert!(parse_texture_size("0x512").is_err());
        assert!(parse_texture_size("512x0").is_err());
    }

    #[test]
    fn parse_accepts_uppercase_separator_and_whitespace() {
        let t = parse_texture_size(" 64X32 ").unwrap();
        assert_eq!((t.width, t.height), (64, 32));
    }

    #[test]
    fn log_filter_override_applies_unless_blank() {
        let cfg = AppConfig::default().with_overrides(lookup(&[(LOG_FILTER_ENV, "debug")]));
        assert_eq!(cfg.log_filter.as_deref(), Some("debug"));

        let cfg = AppConfig::default().with_overrides(lookup(&[(LOG_FILTER_ENV, "  ")]));
        assert_eq!(cfg.log_filter, None);
    }
}
