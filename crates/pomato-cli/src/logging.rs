use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Filter variable, e.g. `POMATO_LOG=pomato_core=debug`.
pub const LOG_ENV: &str = "POMATO_LOG";

/// Install the stderr subscriber. Defaults to `warn` so the countdown line
/// stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
