use crate::notify::DEFAULT_CHANNEL_CAPACITY;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings for the console core, read from `KIOSK_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Buffered changes per subscriber before it lags.
    pub change_channel_capacity: usize,
    /// Prometheus listener port. Metrics export is off when unset.
    pub metrics_port: Option<u16>,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            change_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            metrics_port: None,
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Absent or unparseable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            change_channel_capacity: lookup("KIOSK_CHANGE_CHANNEL_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.change_channel_capacity),
            metrics_port: lookup("KIOSK_METRICS_PORT").and_then(|s| s.parse().ok()),
            log_filter: lookup("KIOSK_LOG").unwrap_or(defaults.log_filter),
        }
    }
}
