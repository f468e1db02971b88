use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// `RUST_LOG` wins over the configured level when it is set
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Returns `false` if one was already set,
/// which is expected when the host application configured tracing itself.
pub fn init(config: &LoggingConfig) -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter(config))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_levels_and_directives() {
        for level in ["debug", "query_guard=trace,warn", "[[not a filter"] {
            let config = LoggingConfig {
                level: level.to_string(),
            };
            // Never panics, whatever the configured text is
            let _ = env_filter(&config);
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig {
            level: "warn".to_string(),
        };
        let _ = init(&config);
        assert!(!init(&config));
    }
}
