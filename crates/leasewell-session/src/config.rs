//! Session engine configuration.

use std::time::Duration;

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity threshold after which the session expires
    /// (default: 30 minutes).
    pub inactivity_timeout: Duration,
    /// Window before expiry in which the pre-expiry warning hook fires
    /// (default: 5 minutes). The warning UI itself is not built yet.
    pub expiry_warning: Duration,
    /// Interval between inactivity checks (default: 60 seconds).
    pub timer_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(30 * 60),
            expiry_warning: Duration::from_secs(5 * 60),
            timer_interval: Duration::from_secs(60),
        }
    }
}
