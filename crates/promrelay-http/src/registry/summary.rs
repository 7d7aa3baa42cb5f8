//! Summary collector.
//!
//! The `prometheus` crate ships counters, gauges, and histograms but no
//! summary, so this module provides one: a label-keyed set of series, each
//! tracking sample count and sample sum. No quantile objectives are computed,
//! which matches the default summary shape of Prometheus client libraries.
//! Series live in a `DashMap` keyed by the ordered label values.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType, Summary};
use prometheus::Opts;

#[derive(Debug, Default, Clone, Copy)]
struct SummaryState {
    count: u64,
    sum: f64,
}

struct SummaryInner {
    desc: Desc,
    series: DashMap<Vec<String>, SummaryState>,
}

/// Summary partitioned by label values. Cloning shares the series.
#[derive(Clone)]
pub struct SummaryVec {
    inner: Arc<SummaryInner>,
}

impl SummaryVec {
    pub fn new(opts: Opts, label_names: &[&str]) -> prometheus::Result<Self> {
        if label_names.contains(&"quantile") {
            return Err(prometheus::Error::Msg(
                "\"quantile\" is reserved for summary quantile labels".into(),
            ));
        }
        let fq_name = [&opts.namespace, &opts.subsystem, &opts.name]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("_");
        let desc = Desc::new(
            fq_name,
            opts.help.clone(),
            label_names.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self {
            inner: Arc::new(SummaryInner {
                desc,
                series: DashMap::new(),
            }),
        })
    }

    /// Record one observation for the given label values (same order as the
    /// label names passed to `new`).
    pub fn observe(&self, label_values: &[&str], v: f64) -> prometheus::Result<()> {
        let expect = self.inner.desc.variable_labels.len();
        if label_values.len() != expect {
            return Err(prometheus::Error::InconsistentCardinality {
                expect,
                got: label_values.len(),
            });
        }
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        let mut state = self.inner.series.entry(key).or_default();
        state.count += 1;
        state.sum += v;
        Ok(())
    }

    /// (count, sum) for one series, if it has been observed.
    #[cfg(test)]
    fn snapshot(&self, label_values: &[&str]) -> Option<(u64, f64)> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.inner.series.get(&key).map(|s| (s.count, s.sum))
    }

    #[cfg(test)]
    fn reset(&self) {
        self.inner.series.clear();
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let desc = &self.inner.desc;
        let mut series: Vec<(Vec<String>, SummaryState)> = self
            .inner
            .series
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));

        let mut mf = MetricFamily::default();
        mf.set_name(desc.fq_name.clone());
        mf.set_help(desc.help.clone());
        mf.set_field_type(MetricType::SUMMARY);

        for (values, state) in series {
            let mut m = Metric::default();
            for (name, value) in desc.variable_labels.iter().zip(values) {
                let mut pair = LabelPair::default();
                pair.set_name(name.clone());
                pair.set_value(value);
                m.mut_label().push(pair);
            }
            let mut s = Summary::default();
            s.set_sample_count(state.count);
            s.set_sample_sum(state.sum);
            m.set_summary(s);
            mf.mut_metric().push(m);
        }
        vec![mf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_with(labels: &[&str]) -> SummaryVec {
        SummaryVec::new(Opts::new("payload_bytes", "Payload sizes").namespace("shop"), labels).unwrap()
    }

    #[test]
    fn accumulates_per_series() {
        let s = vec_with(&["route"]);
        s.observe(&["/a"], 2.0).unwrap();
        s.observe(&["/a"], 3.0).unwrap();
        s.observe(&["/b"], 1.0).unwrap();
        assert_eq!(s.snapshot(&["/a"]), Some((2, 5.0)));
        assert_eq!(s.snapshot(&["/b"]), Some((1, 1.0)));
        assert_eq!(s.snapshot(&["/c"]), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let s = vec_with(&["route"]);
        assert!(s.observe(&[], 1.0).is_err());
        assert!(s.observe(&["a", "b"], 1.0).is_err());
    }

    #[test]
    fn collect_exports_count_and_sum() {
        let s = vec_with(&["route"]);
        s.observe(&["/a"], 4.0).unwrap();
        let mfs = s.collect();
        assert_eq!(mfs.len(), 1);
        let mf = &mfs[0];
        assert_eq!(mf.get_name(), "shop_payload_bytes");
        assert_eq!(mf.get_field_type(), MetricType::SUMMARY);
        let m = &mf.get_metric()[0];
        assert_eq!(m.get_label()[0].get_name(), "route");
        assert_eq!(m.get_label()[0].get_value(), "/a");
        assert_eq!(m.get_summary().get_sample_count(), 1);
        assert_eq!(m.get_summary().get_sample_sum(), 4.0);
    }

    #[test]
    fn quantile_label_reserved() {
        assert!(SummaryVec::new(Opts::new("x", "h"), &["quantile"]).is_err());
    }

    #[test]
    fn reset_drops_series() {
        let s = vec_with(&[]);
        s.observe(&[], 1.0).unwrap();
        s.reset();
        assert!(s.collect()[0].get_metric().is_empty());
    }
}
