//! Core utilities for vkspin.
//!
//! This crate provides foundational types used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Configuration loading

pub mod config;
mod error;
mod logging;
mod timer;

pub use config::{AppConfig, GraphicsConfig, ValidationMode, WindowConfig};
pub use error::{Error, Result};
pub use logging::{DEFAULT_LOG_FILTER, init_logging, init_logging_with_filter};
pub use timer::Timer;
