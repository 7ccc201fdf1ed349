//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,vkspin=debug";

/// Initialize the global tracing subscriber.
///
/// Filtering honours `RUST_LOG` and falls back to [`DEFAULT_LOG_FILTER`].
///
/// # Example
/// ```
/// vkspin_core::init_logging();
/// tracing::info!("Renderer initialized");
/// ```
pub fn init_logging() {
    init_logging_with_filter(DEFAULT_LOG_FILTER);
}

/// Initialize logging with a caller-provided fallback filter.
///
/// Calling this more than once is harmless; only the first subscriber wins.
pub fn init_logging_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}
