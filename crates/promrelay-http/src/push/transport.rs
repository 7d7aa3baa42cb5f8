//! Export batches and the wire transport to a Pushgateway.

use async_trait::async_trait;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

use promrelay_core::definition::RESERVED_LABELS;
use promrelay_core::error::{RelayError, Result};
use promrelay_core::PushOptions;

/// One push cycle's payload.
#[derive(Debug, Clone)]
pub struct PushBatch {
    pub gateway_url: String,
    pub job: String,
    /// Extra grouping labels; always `instance` for batches built from options.
    pub grouping: Vec<(String, String)>,
    pub families: Vec<MetricFamily>,
}

impl PushBatch {
    pub fn new(opts: &PushOptions, families: Vec<MetricFamily>) -> Self {
        Self {
            gateway_url: opts.gateway_url.clone(),
            job: opts.job_name.clone(),
            grouping: vec![("instance".to_string(), opts.instance.clone())],
            families,
        }
    }
}

/// Submits a batch to the remote gateway.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, batch: &PushBatch) -> Result<()>;
}

/// `PUT <gateway>/metrics/job/<job>/<label>/<value>...` with the text
/// exposition format. PUT replaces every metric in the group.
///
/// No request timeout is set; pass a configured client to `with_client` for one.
#[derive(Debug, Clone, Default)]
pub struct HttpPushTransport {
    client: reqwest::Client,
}

impl HttpPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Build the grouping URL for a batch.
pub fn push_url(gateway_url: &str, job: &str, grouping: &[(String, String)]) -> Result<String> {
    if job.is_empty() {
        return Err(RelayError::Export("job name must not be empty".into()));
    }
    if job.contains('/') {
        return Err(RelayError::Export(format!("job contains '/': {job}")));
    }

    let mut url = if gateway_url.contains("://") {
        gateway_url.to_string()
    } else {
        format!("http://{gateway_url}")
    };
    while url.ends_with('/') {
        url.pop();
    }
    url.push_str("/metrics/job/");
    url.push_str(job);

    for (name, value) in grouping {
        if value.is_empty() {
            return Err(RelayError::Export(format!("value of grouping label {name} is empty")));
        }
        if value.contains('/') {
            return Err(RelayError::Export(format!(
                "value of grouping label {name} contains '/': {value}"
            )));
        }
        url.push('/');
        url.push_str(name);
        url.push('/');
        url.push_str(value);
    }
    Ok(url)
}

/// Pushed metrics must not carry labels the gateway assigns from the URL.
fn check_reserved_labels(batch: &PushBatch) -> Result<()> {
    for mf in &batch.families {
        for m in mf.get_metric() {
            for lp in m.get_label() {
                let name = lp.get_name();
                if RESERVED_LABELS.contains(&name) || batch.grouping.iter().any(|(g, _)| g == name) {
                    return Err(RelayError::Export(format!(
                        "pushed metric {} already contains grouping label {name}",
                        mf.get_name()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn push(&self, batch: &PushBatch) -> Result<()> {
        let url = push_url(&batch.gateway_url, &batch.job, &batch.grouping)?;
        check_reserved_labels(batch)?;

        let encoder = TextEncoder::new();
        let mut body = Vec::new();
        encoder
            .encode(&batch.families, &mut body)
            .map_err(|e| RelayError::Export(format!("encode failed: {e}")))?;

        let resp = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, encoder.format_type())
            .body(body)
            .send()
            .await
            .map_err(|e| RelayError::Export(format!("push to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Export(format!(
                "unexpected status code {} while pushing to {url}: {text}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}
