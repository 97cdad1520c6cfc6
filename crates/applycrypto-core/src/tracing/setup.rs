//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the applycrypto tracing/logging system.
///
/// Reads `APPLYCRYPTO_LOG` for per-module log levels.
/// Format: `APPLYCRYPTO_LOG=applycrypto_analysis::call_graph=debug,applycrypto_analysis::flow=trace`
///
/// Falls back to `applycrypto=info` if the variable is unset or invalid.
/// Later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directive()));

        // A host process may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

/// Filter used when `APPLYCRYPTO_LOG` is absent.
pub fn default_directive() -> &'static str {
    "applycrypto=info,applycrypto_core=info,applycrypto_analysis=info"
}
