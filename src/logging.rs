//! Logging setup, powered by tracing-subscriber.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to stderr. `RUST_LOG` wins over
/// `level`; noisy HTTP internals are capped at `warn`.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}

fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];
    for noisy in ["hyper", "hyper_util", "reqwest", "rustls", "h2"] {
        directives.push(format!("{}=warn", noisy));
    }
    Ok(EnvFilter::try_new(directives.join(","))?)
}
