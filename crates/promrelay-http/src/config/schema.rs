use std::collections::HashSet;

use serde::Deserialize;

use promrelay_core::error::{RelayError, Result};
use promrelay_core::options::DEFAULT_INTERVAL_SECS;
use promrelay_core::{MetricDefinition, MetricKind, PushOptions};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Prefix for every metric name. Required; `""` means no prefix.
    pub namespace: String,

    pub push: PushSection,

    #[serde(default)]
    pub metrics: Vec<MetricSection>,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.push_options().validate()?;

        let mut seen = HashSet::new();
        for def in self.definitions() {
            def.validate()?;
            if !seen.insert(def.name.clone()) {
                return Err(RelayError::Config(format!("duplicate metric name: {}", def.name)));
            }
        }
        Ok(())
    }

    pub fn push_options(&self) -> PushOptions {
        let p = &self.push;
        PushOptions::new(p.gateway_url.clone(), p.job_name.clone(), p.instance.clone())
            .with_interval_secs(p.interval_secs)
            .with_monitored_prefixes(p.monitored_prefixes.clone())
    }

    pub fn definitions(&self) -> Vec<MetricDefinition> {
        self.metrics.iter().map(MetricSection::to_definition).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    pub gateway_url: String,

    pub job_name: String,

    #[serde(default = "default_instance")]
    pub instance: String,

    #[serde(default)]
    pub monitored_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSection {
    pub name: String,
    pub kind: MetricKind,
    pub help: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub buckets: Vec<f64>,
}

impl MetricSection {
    pub fn to_definition(&self) -> MetricDefinition {
        MetricDefinition::new(self.kind, self.name.clone(), self.help.clone())
            .with_namespace(self.namespace.clone())
            .with_labels(self.labels.clone())
            .with_buckets(self.buckets.clone())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}
fn default_instance() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".into())
}
