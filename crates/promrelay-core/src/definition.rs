//! Declarative metric descriptions.
//!
//! A `MetricDefinition` is pure data: it names a metric, its kind, and the
//! label schema. Turning it into a live collector happens in the HTTP crate.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::buckets;
use crate::error::{RelayError, Result};

/// Label names taken by the Pushgateway grouping key; a pushed metric may not
/// carry them itself.
pub const RESERVED_LABELS: [&str; 2] = ["job", "instance"];

/// The four collector kinds the registry knows how to create and narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            "histogram" => Ok(MetricKind::Histogram),
            "summary" => Ok(MetricKind::Summary),
            other => Err(RelayError::Config(format!("unknown metric kind: {other}"))),
        }
    }
}

/// One metric to create at registry build time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    /// Overrides the registry namespace when non-empty.
    pub namespace: String,
    /// Unique within one registry.
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Ordered label names; observations supply values in the same order.
    pub label_names: Vec<String>,
    /// Histogram upper bounds. Empty means the collector library defaults.
    pub buckets: Vec<f64>,
}

impl MetricDefinition {
    pub fn new(kind: MetricKind, name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
            help: help.into(),
            kind,
            label_names: Vec::new(),
            buckets: Vec::new(),
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Counter, name, help)
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Gauge, name, help)
    }

    pub fn histogram(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Histogram, name, help)
    }

    pub fn summary(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Summary, name, help)
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_names = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_buckets(mut self, buckets: impl Into<Vec<f64>>) -> Self {
        self.buckets = buckets.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The namespace this definition is created under.
    pub fn effective_namespace<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.namespace.is_empty() {
            fallback
        } else {
            &self.namespace
        }
    }

    /// Structural checks that do not depend on the collector library.
    ///
    /// Name syntax is left to the library; this only rejects what the library
    /// would silently accept or report confusingly.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RelayError::Config("metric name must not be empty".into()));
        }
        if self.help.trim().is_empty() {
            return Err(RelayError::Config(format!(
                "metric {}: help must not be empty",
                self.name
            )));
        }
        for (i, l) in self.label_names.iter().enumerate() {
            if RESERVED_LABELS.contains(&l.as_str()) {
                return Err(RelayError::Config(format!(
                    "metric {}: label name {l} is reserved for push grouping",
                    self.name
                )));
            }
            if self.label_names[..i].contains(l) {
                return Err(RelayError::Config(format!(
                    "metric {}: duplicate label name: {l}",
                    self.name
                )));
            }
        }
        if self.kind == MetricKind::Histogram && !buckets::is_valid(&self.buckets) {
            return Err(RelayError::Config(format!(
                "metric {}: buckets must be finite and strictly increasing",
                self.name
            )));
        }
        Ok(())
    }
}
