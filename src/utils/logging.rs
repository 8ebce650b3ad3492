// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. The PDF and spreadsheet readers are
/// held at `warn` so page-level chatter does not drown the extraction log.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "compliance_extractor=debug,lopdf=warn,calamine=warn"
    } else {
        "compliance_extractor=info,lopdf=warn,calamine=warn"
    }
}

/// Installs the global `tracing` subscriber, writing to stderr so
/// `extract --stdout` output stays clean JSON.
/// `RUST_LOG` takes precedence over `verbose`.
pub fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();

    tracing::debug!("Logging setup complete (verbose: {}).", verbose);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(EnvFilter::try_new(directives).is_ok(), "{directives}");
            assert!(directives.contains("lopdf=warn"));
        }
        assert!(default_directives(true).starts_with("compliance_extractor=debug"));
    }
}
