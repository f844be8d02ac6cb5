//! Tracing setup for hosts that do not install their own subscriber.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debugging.
///
/// Call this once at host startup to enable tracing output.
/// Set `RUST_LOG=quill_eval=debug` to see call-engine and collector events.
/// Does nothing when `RUST_LOG` is unset, and nothing on later calls.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
