//! Push options: where, how often, and under which labels metrics are exported.

use std::time::Duration;

use crate::error::{RelayError, Result};

/// Default export period.
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

/// Immutable for the middleware's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOptions {
    /// Period between export cycles; must be at least 1.
    pub interval_secs: u64,
    pub gateway_url: String,
    pub job_name: String,
    /// Grouping label value, e.g. pod name or hostname.
    pub instance: String,
    /// Empty means every request path is timed.
    pub monitored_prefixes: Vec<String>,
}

impl PushOptions {
    pub fn new(
        gateway_url: impl Into<String>,
        job_name: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            gateway_url: gateway_url.into(),
            job_name: job_name.into(),
            instance: instance.into(),
            monitored_prefixes: Vec::new(),
        }
    }

    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn with_monitored_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.monitored_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(RelayError::Config("push.interval_secs must be at least 1".into()));
        }
        if self.gateway_url.trim().is_empty() {
            return Err(RelayError::Config("push.gateway_url must not be empty".into()));
        }
        if self.job_name.trim().is_empty() {
            return Err(RelayError::Config("push.job_name must not be empty".into()));
        }
        if self.job_name.contains('/') {
            return Err(RelayError::Config("push.job_name must not contain '/'".into()));
        }
        if self.instance.trim().is_empty() {
            return Err(RelayError::Config("push.instance must not be empty".into()));
        }
        if self.instance.contains('/') {
            return Err(RelayError::Config("push.instance must not contain '/'".into()));
        }
        if self.monitored_prefixes.iter().any(|p| p.is_empty()) {
            return Err(RelayError::Config(
                "push.monitored_prefixes must not contain empty entries".into(),
            ));
        }
        Ok(())
    }
}
