//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when neither `RUST_LOG` nor a configured filter is present.
pub const DEFAULT_FILTER: &str = "info,renderer_rhi=debug,renderer_renderer=debug";

/// Installs the global tracing subscriber with [`DEFAULT_FILTER`].
///
/// `RUST_LOG` takes precedence when set.
///
/// # Example
/// ```
/// renderer_core::init_logging();
/// tracing::info!("Renderer initialized");
/// ```
pub fn init_logging() {
    init_logging_with(None);
}

/// Installs the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG`, then `filter`, then
/// [`DEFAULT_FILTER`]. Calling this more than once is harmless; later calls
/// leave the first subscriber in place.
pub fn init_logging_with(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        filter
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging_with(Some("warn"));
        init_logging();
    }
}
