use tracing_subscriber::{fmt, EnvFilter};

/// Installs a compact `fmt` subscriber. `RUST_LOG` wins over `log_level`.
/// Returns false if a global subscriber was already set.
pub fn init_tracing(log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .compact()
        .try_init()
        .is_ok()
}
