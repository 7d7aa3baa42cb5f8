//! Kind-tagged live collectors.

use prometheus::core::Collector as _;
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, HistogramVec};

use promrelay_core::MetricKind;

use super::summary::SummaryVec;

/// A live collector produced by a `CollectorFactory`.
///
/// Narrowing goes through the `as_*` accessors, which return `None` on a kind
/// mismatch instead of faulting.
#[derive(Clone)]
pub enum Collector {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
    Summary(SummaryVec),
}

impl Collector {
    pub fn kind(&self) -> MetricKind {
        match self {
            Collector::Counter(_) => MetricKind::Counter,
            Collector::Gauge(_) => MetricKind::Gauge,
            Collector::Histogram(_) => MetricKind::Histogram,
            Collector::Summary(_) => MetricKind::Summary,
        }
    }

    pub fn as_counter(&self) -> Option<&CounterVec> {
        match self {
            Collector::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&GaugeVec> {
        match self {
            Collector::Gauge(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramVec> {
        match self {
            Collector::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<&SummaryVec> {
        match self {
            Collector::Summary(s) => Some(s),
            _ => None,
        }
    }

    /// Current state of every series, as metric families.
    pub fn collect(&self) -> Vec<MetricFamily> {
        match self {
            Collector::Counter(c) => c.collect(),
            Collector::Gauge(g) => g.collect(),
            Collector::Histogram(h) => h.collect(),
            Collector::Summary(s) => s.collect(),
        }
    }

    /// Boxed handle for registration into a `prometheus::Registry`.
    pub(crate) fn boxed(&self) -> Box<dyn prometheus::core::Collector> {
        match self {
            Collector::Counter(c) => Box::new(c.clone()),
            Collector::Gauge(g) => Box::new(g.clone()),
            Collector::Histogram(h) => Box::new(h.clone()),
            Collector::Summary(s) => Box::new(s.clone()),
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Collector").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Opts;

    #[test]
    fn narrowing_matches_kind_only() {
        let c = Collector::Counter(CounterVec::new(Opts::new("hits", "Hits"), &["path"]).unwrap());
        assert_eq!(c.kind(), MetricKind::Counter);
        assert!(c.as_counter().is_some());
        assert!(c.as_gauge().is_none());
        assert!(c.as_histogram().is_none());
        assert!(c.as_summary().is_none());
    }

    #[test]
    fn collect_reflects_increments() {
        let c = Collector::Counter(CounterVec::new(Opts::new("hits", "Hits"), &["path"]).unwrap());
        c.as_counter().unwrap().with_label_values(&["/a"]).inc_by(3.0);
        let mfs = c.collect();
        assert_eq!(mfs[0].get_metric()[0].get_counter().get_value(), 3.0);
    }
}
