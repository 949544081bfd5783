//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events. Binaries and test suites that
//! want to see them call [`init_tracing`]; the filter comes from
//! `BINMOCK_LOG` using `EnvFilter` syntax.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "BINMOCK_LOG";

/// Install a stderr fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed, which is
/// expected when several tests race to initialise logging.
pub fn init_tracing(default_level: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
