use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Installs the stdout subscriber. `RUST_LOG` wins over `verbose`.
///
/// The library crates log through the `log` facade; the subscriber's log
/// bridge picks those records up as well. Fails if a global subscriber is
/// already installed.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        // The first call may already fail if another test installed one.
        let _ = init(false);
        let err = init(true).unwrap_err();
        assert!(err.to_string().contains("log subscriber"));
    }
}
