//! Error types shared by the vkspin crates.

use thiserror::Error;

/// Top-level error for window, configuration and surface failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Vulkan-related errors raised outside the RHI layer (surface creation)
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values that parsed but cannot be used
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the core Error type.
pub type Result<T> = std::result::Result<T, Error>;
