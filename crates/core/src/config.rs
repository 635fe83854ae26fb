//! Application configuration loaded from TOML.
//!
//! Every field has a default, so a partial file (or no file at all) is valid:
//!
//! ```toml
//! [window]
//! width = 1024
//! height = 768
//!
//! [renderer]
//! clear_color = [0.1, 0.1, 0.1, 1.0]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Test Window".to_string(),
            resizable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Enables `VK_LAYER_KHRONOS_validation` and the debug messenger.
    pub enable_validation: bool,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// RGBA clear color of the color attachment.
    pub clear_color: [f32; 4],
    pub field_of_view_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
            clear_color: [0.6, 0.65, 0.4, 1.0],
            field_of_view_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Image applied to the demo quads. A checkerboard is used if it is missing.
    pub texture: PathBuf,
    pub rotation_speed_degrees: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            texture: PathBuf::from("textures/giraffe.jpg"),
            rotation_speed_degrees: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl AppConfig {
    /// Parses the TOML file at `path` and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the effective configuration.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let renderer = &self.renderer;
        if renderer.near <= 0.0 {
            return Err(Error::Config(format!(
                "near plane must be positive, got {}",
                renderer.near
            )));
        }
        if renderer.far <= renderer.near {
            return Err(Error::Config(format!(
                "far plane ({}) must lie beyond near plane ({})",
                renderer.far, renderer.near
            )));
        }
        if !(renderer.field_of_view_degrees > 0.0 && renderer.field_of_view_degrees < 180.0) {
            return Err(Error::Config(format!(
                "field of view must be in (0, 180) degrees, got {}",
                renderer.field_of_view_degrees
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "Test Window");
        assert!(!config.window.resizable);
        assert_eq!(config.renderer.clear_color, [0.6, 0.65, 0.4, 1.0]);
        assert_eq!(config.renderer.vertex_shader, PathBuf::from("shaders/vert.spv"));
        assert_eq!(config.scene.rotation_speed_degrees, 10.0);
        assert!(config.logging.filter.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [window]
            width = 1024

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.renderer.far, 100.0);
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = AppConfig::from_toml_str("[window\nwidth = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let err = AppConfig::from_toml_str("[window]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.renderer.near = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.renderer.far = config.renderer.near;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.renderer.field_of_view_degrees = 180.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_string_parses_back() {
        let mut config = AppConfig::default();
        config.window.title = "Spinning quads".to_string();
        config.renderer.enable_validation = true;

        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let path = std::env::temp_dir().join("renderer_core_missing_config.toml");
        let _ = std::fs::remove_file(&path);
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "renderer_core_config_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[scene]\nrotation_speed_degrees = 45.0\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.scene.rotation_speed_degrees, 45.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("renderer_core_definitely_missing.toml");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(AppConfig::load(&path), Err(Error::Io(_))));
    }
}
