//! promrelay demo server.
//!
//! - Loads `promrelay.yaml` (or the path given as the first argument)
//! - Times requests through the middleware and pushes to the configured gateway
//! - `/api/orders` bumps the `orders_total` counter when the config defines it
//! - Graceful shutdown stops the push loop after the server drains

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Router};
use tracing_subscriber::{fmt, EnvFilter};

use promrelay_http::{config, MetricRegistry, PushMiddleware};

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn place_order(State(registry): State<Arc<MetricRegistry>>) -> (StatusCode, &'static str) {
    if let Some(orders) = registry.counter("orders_total") {
        if let Ok(c) = orders.get_metric_with_label_values(&[]) {
            c.inc();
        }
    }
    (StatusCode::CREATED, "created")
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "promrelay.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let mw = PushMiddleware::new(&cfg.namespace, cfg.push_options(), cfg.definitions())
        .expect("metric registry build failed");

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/orders", post(place_order))
        .with_state(mw.registry());
    let (app, push) = mw.attach(app).expect("attach failed");

    tracing::info!(%listen, gateway = %cfg.push.gateway_url, "promrelay demo starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    let cycles = push.stop().await;
    tracing::info!(cycles, "push loop stopped, bye");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
