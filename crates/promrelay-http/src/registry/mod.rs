//! Metric registry: live collectors keyed by name, plus each one's kind.
//!
//! Built once at middleware construction and read-only afterwards, so it is
//! shared as `Arc<MetricRegistry>` with no lock. Post-build registration would
//! need synchronization; none is offered.

pub mod collector;
pub mod factory;
pub mod summary;

use std::collections::HashMap;

use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, HistogramVec};

use promrelay_core::buckets::INTERVAL_500_MS;
use promrelay_core::error::{RelayError, Result};
use promrelay_core::{MetricDefinition, MetricKind};

pub use collector::Collector;
pub use factory::{CollectorFactory, PrometheusFactory};
pub use summary::SummaryVec;

/// Reserved name of the built-in per-request latency histogram.
///
/// Values are whole milliseconds; the name is kept for dashboard compatibility.
pub const BUILTIN_LATENCY_METRIC: &str = "key_uri_request_duration_seconds";

/// Label names of the built-in histogram, in observation order.
pub const BUILTIN_LATENCY_LABELS: [&str; 3] = ["uri", "method", "status"];

/// The definition appended to every build.
pub fn builtin_latency_definition() -> MetricDefinition {
    MetricDefinition::histogram(
        BUILTIN_LATENCY_METRIC,
        "Duration of key uri request in milliseconds",
    )
    .with_labels(BUILTIN_LATENCY_LABELS)
    .with_buckets(INTERVAL_500_MS)
}

pub struct MetricRegistry {
    collectors: HashMap<String, Collector>,
    kinds: HashMap<String, MetricKind>,
}

impl MetricRegistry {
    /// Build with the default `prometheus` factory.
    pub fn build(namespace: &str, definitions: &[MetricDefinition]) -> Result<Self> {
        Self::build_with(&PrometheusFactory::new(), namespace, definitions)
    }

    /// Build from the caller's definitions plus the built-in latency histogram
    /// (created last). Any failure rejects the whole build.
    pub fn build_with(
        factory: &dyn CollectorFactory,
        namespace: &str,
        definitions: &[MetricDefinition],
    ) -> Result<Self> {
        let builtin = builtin_latency_definition();
        let mut collectors = HashMap::with_capacity(definitions.len() + 1);
        let mut kinds = HashMap::with_capacity(definitions.len() + 1);

        for def in definitions.iter().chain(std::iter::once(&builtin)) {
            let collector = match create_checked(factory, namespace, def, &collectors) {
                Ok(c) => c,
                Err(e) => {
                    collectors.values().for_each(|c| factory.discard(c));
                    return Err(e);
                }
            };
            tracing::debug!(name = %def.name, kind = %def.kind, "collector created");

            kinds.insert(def.name.clone(), def.kind);
            collectors.insert(def.name.clone(), collector);
        }

        Ok(Self { collectors, kinds })
    }

    /// Collector narrowed to its recorded kind.
    ///
    /// `None` when the name is unknown or the stored collector does not match
    /// the recorded kind.
    pub fn get(&self, name: &str) -> Option<&Collector> {
        let collector = self.collectors.get(name)?;
        let kind = self.kinds.get(name)?;
        (collector.kind() == *kind).then_some(collector)
    }

    pub fn counter(&self, name: &str) -> Option<&CounterVec> {
        self.get(name)?.as_counter()
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeVec> {
        self.get(name)?.as_gauge()
    }

    pub fn histogram(&self, name: &str) -> Option<&HistogramVec> {
        self.get(name)?.as_histogram()
    }

    pub fn summary(&self, name: &str) -> Option<&SummaryVec> {
        self.get(name)?.as_summary()
    }

    pub fn kind_of(&self, name: &str) -> Option<MetricKind> {
        self.kinds.get(name).copied()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    /// Never true after a successful build (the built-in is always present).
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Snapshot every collector for export. Families without any series are
    /// pruned, since the exposition encoder rejects them.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> = self
            .collectors
            .values()
            .flat_map(Collector::collect)
            .filter(|mf| !mf.get_metric().is_empty())
            .collect();
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        families
    }
}

fn create_checked(
    factory: &dyn CollectorFactory,
    namespace: &str,
    def: &MetricDefinition,
    built: &HashMap<String, Collector>,
) -> Result<Collector> {
    def.validate()?;
    if built.contains_key(&def.name) {
        return Err(RelayError::Config(format!("duplicate metric name: {}", def.name)));
    }

    let collector = factory.create(def.effective_namespace(namespace), def)?;
    if collector.kind() != def.kind {
        factory.discard(&collector);
        return Err(RelayError::Config(format!(
            "metric {}: factory produced a {} for a {} definition",
            def.name,
            collector.kind(),
            def.kind
        )));
    }
    Ok(collector)
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry").field("kinds", &self.kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Wraps the real factory, remembers what it was asked for, and can be
    /// told to fail on one name.
    #[derive(Default)]
    struct RecordingFactory {
        inner: PrometheusFactory,
        seen: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
        swap_kind: bool,
    }

    impl CollectorFactory for RecordingFactory {
        fn create(&self, namespace: &str, def: &MetricDefinition) -> Result<Collector> {
            self.seen
                .lock()
                .unwrap()
                .push((namespace.to_string(), def.name.clone()));
            if self.fail_on == Some(def.name.as_str()) {
                return Err(RelayError::Config(format!("refused {}", def.name)));
            }
            if self.swap_kind && def.kind == MetricKind::Counter {
                return self.inner.create(namespace, &MetricDefinition::gauge(&def.name, &def.help));
            }
            self.inner.create(namespace, def)
        }

        fn discard(&self, collector: &Collector) {
            self.inner.discard(collector);
        }
    }

    fn defs() -> Vec<MetricDefinition> {
        vec![
            MetricDefinition::counter("orders_total", "Orders placed"),
            MetricDefinition::gauge("queue_depth", "Queue depth").with_labels(["queue"]),
            MetricDefinition::summary("payload_bytes", "Payload size"),
        ]
    }

    #[test]
    fn one_collector_per_definition_plus_builtin() {
        let reg = MetricRegistry::build("shop", &defs()).unwrap();
        assert_eq!(reg.len(), 4);
        assert_eq!(
            reg.names(),
            vec![
                BUILTIN_LATENCY_METRIC,
                "orders_total",
                "payload_bytes",
                "queue_depth"
            ]
        );
        assert_eq!(reg.kind_of(BUILTIN_LATENCY_METRIC), Some(MetricKind::Histogram));
    }

    #[test]
    fn builtin_present_with_no_caller_definitions() {
        let reg = MetricRegistry::build("", &[]).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.histogram(BUILTIN_LATENCY_METRIC).is_some());
        assert!(!reg.is_empty());
    }

    #[test]
    fn builtin_created_last_in_definition_order() {
        let f = RecordingFactory::default();
        MetricRegistry::build_with(&f, "shop", &defs()).unwrap();
        let seen: Vec<String> = f.seen.lock().unwrap().iter().map(|(_, n)| n.clone()).collect();
        assert_eq!(
            seen,
            vec!["orders_total", "queue_depth", "payload_bytes", BUILTIN_LATENCY_METRIC]
        );
    }

    #[test]
    fn duplicate_names_reject_the_build() {
        let mut d = defs();
        d.push(MetricDefinition::gauge("orders_total", "again"));
        let err = MetricRegistry::build("shop", &d).unwrap_err();
        assert_eq!(err.code().as_str(), "CONFIG");
        assert!(err.to_string().contains("orders_total"));
    }

    #[test]
    fn grouping_label_names_reject_the_build() {
        for label in ["job", "instance"] {
            let d = vec![MetricDefinition::counter("jobs_total", "Jobs run").with_labels([label])];
            let err = MetricRegistry::build("shop", &d).unwrap_err();
            assert_eq!(err.code().as_str(), "CONFIG");
            assert!(err.to_string().contains(label));
        }
    }

    #[test]
    fn failed_build_leaves_shared_registry_reusable() {
        let shared = prometheus::Registry::new();
        let f = PrometheusFactory::with_registry(shared.clone());

        let mut d = defs();
        d.push(MetricDefinition::gauge("orders_total", "again"));
        assert!(MetricRegistry::build_with(&f, "shop", &d).is_err());

        let reg = MetricRegistry::build_with(&f, "shop", &defs()).unwrap();
        reg.counter("orders_total").unwrap().with_label_values(&[]).inc();
        let names: Vec<String> = shared.gather().iter().map(|mf| mf.get_name().to_string()).collect();
        assert_eq!(names, vec!["shop_orders_total"]);
    }

    #[test]
    fn reserved_name_is_a_duplicate() {
        let d = vec![MetricDefinition::counter(BUILTIN_LATENCY_METRIC, "mine")];
        assert!(MetricRegistry::build("shop", &d).is_err());
    }

    #[test]
    fn factory_failure_rejects_the_build() {
        let f = RecordingFactory {
            fail_on: Some("queue_depth"),
            ..Default::default()
        };
        let err = MetricRegistry::build_with(&f, "shop", &defs()).unwrap_err();
        assert!(err.to_string().contains("refused queue_depth"));
        // stopped at the failing definition
        assert_eq!(f.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn factory_kind_mismatch_rejects_the_build() {
        let f = RecordingFactory {
            swap_kind: true,
            ..Default::default()
        };
        assert!(MetricRegistry::build_with(&f, "shop", &defs()).is_err());
    }

    #[test]
    fn definition_namespace_overrides_registry_namespace() {
        let f = RecordingFactory::default();
        let d = vec![MetricDefinition::counter("jobs_total", "Jobs").with_namespace("batch")];
        MetricRegistry::build_with(&f, "shop", &d).unwrap();
        let seen = f.seen.lock().unwrap();
        assert_eq!(seen[0], ("batch".to_string(), "jobs_total".to_string()));
        assert_eq!(seen[1].0, "shop");
    }

    #[test]
    fn lookup_miss_and_narrowing() {
        let reg = MetricRegistry::build("shop", &defs()).unwrap();
        assert!(reg.get("nonexistent").is_none());
        assert!(reg.counter("orders_total").is_some());
        assert!(reg.gauge("orders_total").is_none());
        assert!(reg.summary("payload_bytes").is_some());
    }

    #[test]
    fn gather_skips_untouched_collectors() {
        let reg = MetricRegistry::build("shop", &defs()).unwrap();
        assert!(reg.gather().is_empty());

        reg.counter("orders_total").unwrap().with_label_values(&[]).inc();
        reg.gauge("queue_depth").unwrap().with_label_values(&["mail"]).set(3.0);
        let names: Vec<String> = reg.gather().iter().map(|mf| mf.get_name().to_string()).collect();
        assert_eq!(names, vec!["shop_orders_total", "shop_queue_depth"]);
    }
}
