//! Logging setup
//!
//! Plain tracing to stderr. The harness is a test driver, so there is no
//! exporter, only an env-driven filter.
//!
//! # Example
//!
//! ```no_run
//! use certsuite_harness::telemetry::init_logging;
//!
//! init_logging();
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize logging with tracing-subscriber
///
/// Uses RUST_LOG for filtering (default: info). Safe to call more than once;
/// later calls are no-ops.
pub fn init_logging() {
    init_logging_with("info");
}

/// Initialize logging with an explicit default filter
///
/// RUST_LOG still wins when set.
pub fn init_logging_with(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
