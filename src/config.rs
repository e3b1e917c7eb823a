//! Startup configuration.
//!
//! The backend selection is read once, before the context and the RHI are
//! created, and never changes afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::RhiError, rhi::RenderApiType, window::WindowProps};

/// Environment variable that overrides [`RhiConfig::api`].
pub const RENDER_API_ENV: &str = "GAMEWORLD_RENDER_API";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhiConfig {
    pub api: RenderApiType,
    /// Prefer a discrete adapter over an integrated one.
    pub high_performance: bool,
    /// Attach a depth buffer to every pass; pipelines then have to use
    /// [`crate::data_structures::texture::DepthBuffer::FORMAT`].
    pub depth_buffer: bool,
    /// Initial clear color, RGBA.
    pub clear_color: [f64; 4],
    pub window: WindowProps,
}

impl Default for RhiConfig {
    fn default() -> Self {
        Self {
            api: RenderApiType::default(),
            high_performance: false,
            depth_buffer: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            window: WindowProps::default(),
        }
    }
}

impl RhiConfig {
    pub fn new(api: RenderApiType) -> Self {
        Self {
            api,
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, RhiError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, RhiError> {
        let text = std::fs::read_to_string(path).map_err(|source| RhiError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Applies [`RENDER_API_ENV`] from `lookup` on top of the file settings.
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`.
    pub fn with_env_override(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RhiError> {
        if let Some(api) = lookup(RENDER_API_ENV) {
            self.api = api.parse()?;
            log::debug!("Render backend overridden by {}: {}", RENDER_API_ENV, self.api);
        }
        Ok(self)
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = RhiConfig::from_toml_str("").unwrap();
        assert_eq!(config, RhiConfig::default());
        assert_eq!(config.api, RenderApiType::Primary);
        assert!(config.depth_buffer);
    }

    #[test]
    fn reads_backend_and_window() {
        let config = RhiConfig::from_toml_str(
            r#"
            api = "opengl"
            depth_buffer = false
            clear_color = [0.1, 0.2, 0.3, 1.0]

            [window]
            title = "Sandbox"
            width = 800
            vsync = false
            "#,
        )
        .unwrap();
        assert_eq!(config.api, RenderApiType::OpenGl);
        assert!(!config.depth_buffer);
        assert_eq!(config.clear_color().g, 0.2);
        assert_eq!(config.window.title, "Sandbox");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, WindowProps::default().height);
        assert!(!config.window.vsync);
    }

    #[test]
    fn unknown_backend_in_file_is_rejected() {
        assert!(matches!(
            RhiConfig::from_toml_str(r#"api = "directx9""#),
            Err(RhiError::Config(_))
        ));
    }

    #[test]
    fn env_override_replaces_the_backend() {
        let config = RhiConfig::new(RenderApiType::Vulkan)
            .with_env_override(|key| (key == RENDER_API_ENV).then(|| "noop".to_string()))
            .unwrap();
        assert_eq!(config.api, RenderApiType::Noop);

        let untouched = RhiConfig::new(RenderApiType::Vulkan)
            .with_env_override(|_| None)
            .unwrap();
        assert_eq!(untouched.api, RenderApiType::Vulkan);

        assert!(matches!(
            RhiConfig::default().with_env_override(|_| Some("glide".into())),
            Err(RhiError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn load_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhi.toml");
        assert!(matches!(RhiConfig::load(&path), Err(RhiError::ConfigIo { .. })));

        std::fs::write(&path, "api = \"noop\"\n").unwrap();
        assert_eq!(RhiConfig::load(&path).unwrap().api, RenderApiType::Noop);
    }
}
