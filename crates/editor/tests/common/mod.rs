//! Shared setup for the integration suites.

use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Install the env-filtered log subscriber once per test binary, so
/// `RUST_LOG` surfaces the engine's tracing output under test.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
