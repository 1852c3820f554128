use std::time::Duration;

/// Configuration for a [`RecordLog`](crate::RecordLog).
///
/// Use the builder methods to customize, or [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use bpmn_assert::Config;
///
/// let config = Config::default()
///     .with_settle_timeout(Duration::from_secs(5))   // slower engines
///     .with_initial_capacity(4096);                 // long scenarios
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// How long [`RecordLog::settle_on`](crate::RecordLog::settle_on) waits
    /// before giving up, unless overridden with `within`.
    /// Default: 1s
    settle_timeout: Duration,

    /// Number of records the log reserves room for up front.
    /// Default: 256
    initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settle_timeout: Duration::from_secs(1),
            initial_capacity: 256,
        }
    }
}

impl Config {
    /// Set the default timeout for condition-based settling.
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Returns the default timeout for condition-based settling.
    pub fn settle_timeout(&self) -> Duration {
        self.settle_timeout
    }

    /// Set the number of records reserved when the log is created.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.settle_timeout(), Duration::from_secs(1));
        assert_eq!(config.initial_capacity(), 256);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::default()
            .with_settle_timeout(Duration::from_millis(250))
            .with_initial_capacity(16);
        assert_eq!(config.settle_timeout(), Duration::from_millis(250));
        assert_eq!(config.initial_capacity(), 16);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
