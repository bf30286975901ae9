//! Pump configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// What to do with events that piled up while the relay was not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupPolicy {
    /// Fast-forward the cursor past the backlog without forwarding it.
    #[default]
    DrainBacklog,
    /// Leave the cursor unset so the first poll delivers the backlog.
    Replay,
}

/// Configuration for the pump.
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// How long the source may hold a poll open.
    pub poll_wait: Duration,
    /// Client-side limit for one poll call. Must exceed `poll_wait`.
    pub poll_timeout: Duration,
    /// Pause after a failed poll.
    pub backoff: Duration,
    /// Backlog handling when no saved cursor exists.
    pub startup: StartupPolicy,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            poll_wait: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(35),
            backoff: Duration::from_secs(5),
            startup: StartupPolicy::DrainBacklog,
        }
    }
}

impl PumpConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server-side wait budget.
    pub fn with_poll_wait(mut self, wait: Duration) -> Self {
        self.poll_wait = wait;
        self
    }

    /// Sets the client-side poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the backoff after a failed poll.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the startup policy.
    pub fn with_startup(mut self, startup: StartupPolicy) -> Self {
        self.startup = startup;
        self
    }

    /// Checks that a slow but healthy long poll cannot be mistaken for a hang.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout <= self.poll_wait {
            return Err(ConfigError::TimeoutNotAboveWait {
                wait: self.poll_wait,
                timeout: self.poll_timeout,
            });
        }
        if self.backoff.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "backoff".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PumpConfig::default();

        assert_eq!(config.poll_wait, Duration::from_secs(30));
        assert_eq!(config.poll_timeout, Duration::from_secs(35));
        assert_eq!(config.backoff, Duration::from_secs(5));
        assert_eq!(config.startup, StartupPolicy::DrainBacklog);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PumpConfig::new()
            .with_poll_wait(Duration::from_secs(10))
            .with_poll_timeout(Duration::from_secs(12))
            .with_backoff(Duration::from_secs(1))
            .with_startup(StartupPolicy::Replay);

        assert_eq!(config.poll_wait, Duration::from_secs(10));
        assert_eq!(config.poll_timeout, Duration::from_secs(12));
        assert_eq!(config.backoff, Duration::from_secs(1));
        assert_eq!(config.startup, StartupPolicy::Replay);
    }

    #[test]
    fn test_timeout_must_exceed_wait() {
        let config = PumpConfig::new()
            .with_poll_wait(Duration::from_secs(30))
            .with_poll_timeout(Duration::from_secs(30));

        assert!(matches!(
            config.validate(),
            Err(ConfigError::TimeoutNotAboveWait { .. })
        ));
    }

    #[test]
    fn test_zero_backoff_rejected() {
        let config = PumpConfig::new().with_backoff(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
