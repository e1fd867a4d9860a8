use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the broker URI when it is not given on the
/// command line.
pub const AMQP_ADDR: &str = "AMQP_ADDR";

const DEFAULT_LOG_FILTER: &str = "rmqdump=info,lapin=warn";

/// Loads `.env` from the current directory or its parents, if there is one.
///
/// Must run before the command line is parsed so that `AMQP_ADDR` from the
/// file can stand in for the positional URI.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Installs the global subscriber. Logs go to stderr; stdout carries data.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
