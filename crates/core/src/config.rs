//! Application configuration.
//!
//! Configuration is a plain value built once at startup and handed to the
//! window and renderer. Every field has a default, so an empty TOML file (or
//! no file at all) yields a working setup:
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//!
//! [graphics]
//! validation = "enabled"
//! max_frames_in_flight = 3
//! frame_timeout_ms = 2000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Layer enabled when validation is on.
pub const KHRONOS_VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Device extension every configuration must request.
pub const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
}

/// Window creation parameters.
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
            title: "Vulkan".to_string(),
            resizable: true,
        }
    }
}

/// Whether the Khronos validation layers are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// On in debug builds, off in release builds.
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl ValidationMode {
    /// Resolves the mode against the current build profile.
    pub fn is_enabled(self) -> bool {
        match self {
            ValidationMode::Auto => cfg!(debug_assertions),
            ValidationMode::Enabled => true,
            ValidationMode::Disabled => false,
        }
    }
}

/// Vulkan bootstrap and frame pacing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub validation: ValidationMode,
    /// Instance layers requested when validation is enabled.
    pub validation_layers: Vec<String>,
    /// Device extensions a GPU must support to be selected.
    pub device_extensions: Vec<String>,
    /// Number of frame slots (N). Independent of the swapchain image count.
    pub max_frames_in_flight: usize,
    /// Upper bound for fence waits and image acquisition. `None` waits forever.
    pub frame_timeout_ms: Option<u64>,
    /// Use MAILBOX presentation when the surface offers it; FIFO otherwise.
    pub prefer_mailbox: bool,
    /// RGBA clear color of the render pass.
    pub clear_color: [f32; 4],
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Auto,
            validation_layers: vec![KHRONOS_VALIDATION_LAYER.to_string()],
            device_extensions: vec![SWAPCHAIN_EXTENSION.to_string()],
            max_frames_in_flight: 2,
            frame_timeout_ms: None,
            prefer_mailbox: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl GraphicsConfig {
    /// Validation layers to enable, empty when validation is off.
    pub fn enabled_layers(&self) -> &[String] {
        if self.validation.is_enabled() {
            &self.validation_layers
        } else {
            &[]
        }
    }

    /// Frame wait bound as a duration, `None` for an unbounded wait.
    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }
}

impl AppConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Rejects values the renderer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.window.title.trim().is_empty() {
            return Err(Error::Config("window title must not be empty".to_string()));
        }
        if self.graphics.max_frames_in_flight == 0 {
            return Err(Error::Config(
                "max_frames_in_flight must be at least 1".to_string(),
            ));
        }
        if !self
            .graphics
            .device_extensions
            .iter()
            .any(|ext| ext == SWAPCHAIN_EXTENSION)
        {
            return Err(Error::Config(format!(
                "device_extensions must include {SWAPCHAIN_EXTENSION}"
            )));
        }
        if self.graphics.frame_timeout_ms == Some(0) {
            return Err(Error::Config(
                "frame_timeout_ms must be positive; omit it to wait forever".to_string(),
            ));
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
        assert_eq!(config.window.title, "Vulkan");
        assert_eq!(config.graphics.max_frames_in_flight, 2);
        assert_eq!(config.graphics.frame_timeout(), None);
        assert_eq!(
            config.graphics.validation_layers,
            vec![KHRONOS_VALIDATION_LAYER.to_string()]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [window]
            title = "Spin"

            [graphics]
            validation = "disabled"
            max_frames_in_flight = 3
            frame_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.window.title, "Spin");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.graphics.validation, ValidationMode::Disabled);
        assert!(config.graphics.enabled_layers().is_empty());
        assert_eq!(config.graphics.max_frames_in_flight, 3);
        assert_eq!(
            config.graphics.frame_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_rejects_zero_frames_in_flight() {
        let err = AppConfig::from_toml_str("[graphics]\nmax_frames_in_flight = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_window() {
        let mut config = AppConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_swapchain_extension() {
        let mut config = AppConfig::default();
        config.graphics.device_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.graphics.frame_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml_str("[window\nwidth = 1").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_validation_mode_explicit() {
        assert!(ValidationMode::Enabled.is_enabled());
        assert!(!ValidationMode::Disabled.is_enabled());
        assert_eq!(
            ValidationMode::Auto.is_enabled(),
            cfg!(debug_assertions)
        );
    }

    #[test]
    fn test_toml_round_trip_preserves_values() {
        let mut config = AppConfig::default();
        config.graphics.clear_color = [0.1, 0.2, 0.3, 1.0];
        config.graphics.frame_timeout_ms = Some(1000);
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/vkspin.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
