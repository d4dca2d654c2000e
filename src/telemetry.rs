use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;

/// Install a global `fmt` subscriber filtered at `level`.
///
/// `level` accepts anything `EnvFilter` does, from a bare `info` to per-target
/// directives such as `network_tap=debug,structural_watcher=info`. Fails if a
/// global subscriber is already set.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log level '{level}'"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_directives() {
        assert!(init_logging("network_tap=verbose").is_err());
    }
}
