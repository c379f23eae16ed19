// Define a new module for logging initialization
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Picks the active filter: valid `RUST_LOG` directives win outright,
/// otherwise `cotacao` logs at debug or info and everything else at warn.
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let from_env = rust_log
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok());
    if let Some(filter) = from_env {
        return filter;
    }
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("warn,cotacao={level}"))
}

pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(log_filter(verbose, rust_log.as_deref()))
        .init();
}
