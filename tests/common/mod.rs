pub mod server;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install the test tracing subscriber once; verbosity comes from RUST_LOG.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
