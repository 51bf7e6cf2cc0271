//! Tracing subscriber setup for hosts and tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVES: &str = "ema_client=info";

/// Install the global subscriber with [`DEFAULT_DIRECTIVES`].
///
/// Returns an error if a subscriber is already installed.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    init_with(DEFAULT_DIRECTIVES)
}

/// Install the global subscriber, falling back to `directives` when
/// `RUST_LOG` is unset or invalid.
pub fn init_with(directives: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| directives.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        // The first call may race other tests; the second always fails.
        let _ = init_with("ema_client=debug");
        assert!(init().is_err());
    }
}
