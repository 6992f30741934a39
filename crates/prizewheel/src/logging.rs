//! Tracing subscriber setup for host processes.
//!
//! Library crates only emit through `tracing`; a binary calls
//! [`init_logging`] once at startup. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber with [`DEFAULT_FILTER`].
///
/// Returns false if a subscriber was already installed.
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_FILTER)
}

/// Installs the global subscriber, falling back to `default_filter`.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging_with(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        let _ = init_logging_with("debug");
        assert!(!init_logging());
    }
}
