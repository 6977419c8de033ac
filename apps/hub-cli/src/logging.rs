//! Tracing bootstrap.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Precedence:
/// 1) `RUST_LOG`
/// 2) `HUBCHAT_LOG`
/// 3) `log_filter` from the config file
/// 4) `info`
pub fn init(config_filter: Option<&str>) {
    let env_filter = select_filter(
        env::var("RUST_LOG").ok().as_deref(),
        env::var("HUBCHAT_LOG").ok().as_deref(),
        config_filter,
    );
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .try_init();
}

/// First candidate that is non-blank and parses wins.
fn select_filter(
    rust_log: Option<&str>,
    hubchat_log: Option<&str>,
    config: Option<&str>,
) -> EnvFilter {
    [rust_log, hubchat_log, config]
        .into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .find_map(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
