//! Middleware facade: registry + interceptor + push loop.
//!
//! ```no_run
//! # async fn demo() -> promrelay_core::Result<()> {
//! use promrelay_core::{MetricDefinition, PushOptions};
//! use promrelay_http::PushMiddleware;
//!
//! let opts = PushOptions::new("http://pushgateway:9091", "shop-api", "pod-1");
//! let mw = PushMiddleware::new("shop", opts, vec![MetricDefinition::counter("orders_total", "Orders")])?;
//! let app: axum::Router = axum::Router::new();
//! let (app, handle) = mw.attach(app)?;
//! // serve `app` ...
//! handle.stop().await;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use promrelay_core::error::{RelayError, Result};
use promrelay_core::{MetricDefinition, PushOptions};

use crate::intercept::{track_latency, Interceptor};
use crate::obs::LogSink;
use crate::push::{run_push_loop, HttpPushTransport, PushContext, PushTransport};
use crate::registry::{Collector, CollectorFactory, MetricRegistry, PrometheusFactory};

pub struct PushMiddleware {
    registry: Arc<MetricRegistry>,
    opts: Arc<PushOptions>,
    transport: Arc<dyn PushTransport>,
    sink: LogSink,
    attached: AtomicBool,
}

impl PushMiddleware {
    /// Build the registry (caller definitions plus the built-in latency
    /// histogram) with the default `prometheus` factory.
    pub fn new(namespace: &str, opts: PushOptions, definitions: Vec<MetricDefinition>) -> Result<Self> {
        Self::new_with_factory(&PrometheusFactory::new(), namespace, opts, definitions)
    }

    pub fn new_with_factory(
        factory: &dyn CollectorFactory,
        namespace: &str,
        opts: PushOptions,
        definitions: Vec<MetricDefinition>,
    ) -> Result<Self> {
        opts.validate()?;
        let registry = MetricRegistry::build_with(factory, namespace, &definitions)?;
        Ok(Self {
            registry: Arc::new(registry),
            opts: Arc::new(opts),
            transport: Arc::new(HttpPushTransport::new()),
            sink: LogSink::default(),
            attached: AtomicBool::new(false),
        })
    }

    /// Replace the Pushgateway transport (before `attach`).
    pub fn with_transport(mut self, transport: Arc<dyn PushTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn options(&self) -> &PushOptions {
        &self.opts
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    /// Interceptor state for hosts composing their own middleware stack.
    pub fn interceptor(&self) -> Interceptor {
        Interceptor::new(self.registry(), self.opts.monitored_prefixes.clone())
    }

    /// Layer the interceptor over every route already on `router`, then
    /// launch the push loop. Only one attach per instance.
    pub fn attach<S>(&self, router: Router<S>) -> Result<(Router<S>, PushHandle)>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.launch()?;
        let router = router.layer(axum::middleware::from_fn_with_state(
            self.interceptor(),
            track_latency,
        ));
        Ok((router, handle))
    }

    /// Launch the push loop on the current tokio runtime without touching a router.
    pub fn launch(&self) -> Result<PushHandle> {
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| RelayError::Internal(format!("push loop needs a tokio runtime: {e}")))?;
        if self.attached.swap(true, Ordering::SeqCst) {
            return Err(RelayError::AlreadyAttached);
        }

        let ctx = PushContext {
            registry: self.registry(),
            opts: Arc::clone(&self.opts),
            transport: Arc::clone(&self.transport),
            sink: self.sink.clone(),
        };
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = rt.spawn(run_push_loop(ctx, stop_rx));
        Ok(PushHandle { stop_tx, task })
    }

    /// Collector narrowed to its recorded kind, or `None`.
    pub fn get_collector(&self, name: &str) -> Option<&Collector> {
        self.registry.get(name)
    }

    /// Redirect push-cycle log lines. Also applies to a loop already running.
    pub fn set_log_sink<W: Write + Send + 'static>(&self, w: W) {
        self.sink.set(w);
    }
}

/// Owned handle to a running push loop.
#[derive(Debug)]
pub struct PushHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<usize>,
}

impl PushHandle {
    /// Signal the loop and wait until it has exited. Returns the number of push
    /// cycles it attempted. A push in flight is allowed to finish first.
    pub async fn stop(self) -> usize {
        let _ = self.stop_tx.send(());
        match self.task.await {
            Ok(cycles) => cycles,
            Err(e) => {
                tracing::error!(error = %e, "push loop task failed");
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
