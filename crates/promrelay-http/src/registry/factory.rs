//! Metric factory: definition -> live collector.

use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

use promrelay_core::error::{RelayError, Result};
use promrelay_core::{MetricDefinition, MetricKind};

use super::collector::Collector;
use super::summary::SummaryVec;

/// Creates collectors for the registry build step.
///
/// Injected so the registry can be built against fakes, and so any
/// process-wide registration stays out of the registry itself.
pub trait CollectorFactory: Send + Sync {
    fn create(&self, namespace: &str, def: &MetricDefinition) -> Result<Collector>;

    /// Undo whatever `create` registered for a collector the build is
    /// abandoning. Called once per created collector when a build fails.
    fn discard(&self, _collector: &Collector) {}
}

/// Default factory backed by the `prometheus` crate.
///
/// Every collector is also registered into a private `prometheus::Registry`
/// (never the process-global default one), so two middleware instances may
/// use the same metric names. Histograms with no buckets use
/// `prometheus::DEFAULT_BUCKETS` (0.005 .. 10).
#[derive(Clone, Default)]
pub struct PrometheusFactory {
    registry: Registry,
}

impl PrometheusFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register into a caller-owned registry, e.g. one also served on `/metrics`.
    ///
    /// A registry build that fails unregisters what it had already created, so
    /// the same registry can be used for a corrected retry.
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

fn config_err(def: &MetricDefinition, e: prometheus::Error) -> RelayError {
    RelayError::Config(format!("metric {} ({}): {e}", def.name, def.kind))
}

impl CollectorFactory for PrometheusFactory {
    fn create(&self, namespace: &str, def: &MetricDefinition) -> Result<Collector> {
        let labels: Vec<&str> = def.label_names.iter().map(String::as_str).collect();
        let opts = Opts::new(def.name.clone(), def.help.clone()).namespace(namespace);

        let collector = match def.kind {
            MetricKind::Counter => {
                Collector::Counter(CounterVec::new(opts, &labels).map_err(|e| config_err(def, e))?)
            }
            MetricKind::Gauge => {
                Collector::Gauge(GaugeVec::new(opts, &labels).map_err(|e| config_err(def, e))?)
            }
            MetricKind::Histogram => {
                let mut hopts = HistogramOpts::from(opts);
                if !def.buckets.is_empty() {
                    hopts = hopts.buckets(def.buckets.clone());
                }
                Collector::Histogram(HistogramVec::new(hopts, &labels).map_err(|e| config_err(def, e))?)
            }
            MetricKind::Summary => {
                Collector::Summary(SummaryVec::new(opts, &labels).map_err(|e| config_err(def, e))?)
            }
        };

        self.registry
            .register(collector.boxed())
            .map_err(|e| config_err(def, e))?;
        Ok(collector)
    }

    fn discard(&self, collector: &Collector) {
        if let Err(e) = self.registry.unregister(collector.boxed()) {
            tracing::debug!(error = %e, "collector was not registered");
        }
    }
}
