//! Periodic export of the whole registry to a Pushgateway.
//!
//! One loop per attached middleware. Each tick gathers every collector and
//! pushes them as a single batch; failures are logged and the loop waits for
//! the next tick. Ticks never overlap: the next one is not awaited until the
//! current push returns.

pub mod transport;

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use promrelay_core::error::Result;
use promrelay_core::PushOptions;

use crate::obs::log_sink::{LogSink, DATE_TIME_FORMAT};
use crate::registry::MetricRegistry;

pub use transport::{HttpPushTransport, PushBatch, PushTransport};

/// Everything one push loop reads.
#[derive(Clone)]
pub struct PushContext {
    pub registry: Arc<MetricRegistry>,
    pub opts: Arc<PushOptions>,
    pub transport: Arc<dyn PushTransport>,
    pub sink: LogSink,
}

/// Gather, push, and log one cycle.
pub async fn push_once(ctx: &PushContext) -> Result<()> {
    let timestamp = chrono::Local::now().format(DATE_TIME_FORMAT).to_string();
    let batch = PushBatch::new(&ctx.opts, ctx.registry.gather());
    let families = batch.families.len();

    match ctx.transport.push(&batch).await {
        Ok(()) => {
            tracing::info!(job = %batch.job, families, "metrics pushed");
            ctx.sink
                .line(&format!("metrics pushed successfully with timestamp: {timestamp}"));
            Ok(())
        }
        Err(e) => {
            tracing::warn!(job = %batch.job, code = e.code().as_str(), error = %e, "metrics push failed");
            ctx.sink.line(&format!("could not push to gateway: {e}"));
            Err(e)
        }
    }
}

/// Run until `stop` fires (or its sender is dropped). Returns the number of
/// push cycles attempted.
///
/// The first push happens one full interval after start.
pub async fn run_push_loop(ctx: PushContext, mut stop: oneshot::Receiver<()>) -> usize {
    let mut tick = tokio::time::interval(ctx.opts.interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.reset();

    tracing::info!(
        interval_secs = ctx.opts.interval_secs,
        gateway = %ctx.opts.gateway_url,
        job = %ctx.opts.job_name,
        "push loop started"
    );

    let mut cycles = 0usize;
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let _ = push_once(&ctx).await;
                cycles += 1;
            }
            _ = &mut stop => {
                tracing::info!(cycles, "push loop stopped");
                break;
            }
        }
    }
    cycles
}
