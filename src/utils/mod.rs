//! Utilities: logging setup.
//!
//! Key items:
//!   derive_level / init_logging

/// Logging helpers.
pub mod logging {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    /// `-q` wins over `-v`; default is warnings and errors so generated
    /// output on stdout stays clean.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Build the filter: RUST_LOG when set, else the derived level for this
    /// crate only.
    pub fn filter_for(level: LevelFilter) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}={level}", env!("CARGO_CRATE_NAME"))))
    }

    /// Install the global subscriber writing to stderr. Calling it twice is
    /// harmless.
    pub fn init_logging(level: LevelFilter) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter_for(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn level_from_flags() {
        assert_eq!(derive_level(0, false), LevelFilter::WARN);
        assert_eq!(derive_level(1, false), LevelFilter::INFO);
        assert_eq!(derive_level(2, false), LevelFilter::DEBUG);
        assert_eq!(derive_level(9, false), LevelFilter::TRACE);
        assert_eq!(derive_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn init_twice_is_ok() {
        init_logging(LevelFilter::ERROR);
        init_logging(LevelFilter::DEBUG);
    }
}
