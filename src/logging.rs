//! Logging setup: `tracing` events to stderr, filtered by `RUST_LOG` or verbosity flags.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "svnindex=debug",
        (false, true) => "svnindex=warn",
        (false, false) => "svnindex=info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the flags when set.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, true), "svnindex=debug");
        assert_eq!(default_directive(false, true), "svnindex=warn");
        assert_eq!(default_directive(false, false), "svnindex=info");
    }
}
