//! ---
//! mkp_section: "03-observability-logging"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Metrics collection and export utilities."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{response::IntoResponse, Router};
use mkp_common::config::{ActivationMode, Scope};
use prometheus::{
    GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shared registry type used across the workspace.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Spawn an HTTP server that exposes the registry at `/metrics`.
pub fn spawn_http_server(registry: SharedRegistry, addr: SocketAddr) -> Result<MetricsServer> {
    let app = Router::new().route(
        "/metrics",
        get({
            let registry = registry.clone();
            move || metrics_handler(registry.clone())
        }),
    );

    let std_listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind metrics listener {}", addr))?;
    std_listener
        .set_nonblocking(true)
        .with_context(|| "failed to configure metrics listener as non-blocking")?;
    let bound = std_listener
        .local_addr()
        .with_context(|| "failed to resolve metrics listener address")?;
    let listener = TcpListener::from_std(std_listener)
        .with_context(|| "failed to convert std listener into tokio listener")?;

    info!(address = %bound, "metrics server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let service = app.into_make_service();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("metrics server encountered an error")?;
        Ok(())
    });

    Ok(MetricsServer {
        addr: bound,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

/// Prometheus scrape endpoint.
async fn metrics_handler(registry: SharedRegistry) -> impl IntoResponse {
    let families = registry.gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            )],
            body,
        ),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                )],
                String::from("metrics encoding error"),
            )
        }
    }
}

/// Handle to the running HTTP exporter.
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    /// Return the bound address; resolves port `0` to the port actually assigned.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        }
    }
}

/// Metrics recorded by the daemon process itself.
#[derive(Clone)]
pub struct DaemonMetrics {
    registry: SharedRegistry,
    starts_total: IntCounter,
    config_load_seconds: Histogram,
    build_info: GaugeVec,
}

impl DaemonMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let starts_total = IntCounter::with_opts(Opts::new(
            "mkpd_starts_total",
            "Total number of times the provider daemon has initialised",
        ))?;
        registry.register(Box::new(starts_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.001, 2.0, 16)
            .context("failed to construct histogram buckets")?;
        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mkpd_config_load_seconds",
                "Time spent loading and validating configuration",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        let build_info = GaugeVec::new(
            Opts::new(
                "mkpd_build_info",
                "Build metadata for the running daemon binary",
            ),
            &["version", "profile"],
        )?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry,
            starts_total,
            config_load_seconds,
            build_info,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn inc_start(&self) {
        self.starts_total.inc();
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }

    pub fn set_build_info(&self, version: &str, profile: &str) {
        self.build_info
            .with_label_values(&[version, profile])
            .set(1.0);
    }
}

/// Outcome of registration passes, labelled by scope and activation mode.
#[derive(Clone)]
pub struct RegistrationMetrics {
    registry: SharedRegistry,
    registered: IntGaugeVec,
    failures: IntCounterVec,
    pass_seconds: HistogramVec,
}

impl RegistrationMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let registered = IntGaugeVec::new(
            Opts::new(
                "mkp_registered_controllers",
                "Controller units that completed registration in the last pass",
            ),
            &["scope", "mode"],
        )?;
        registry.register(Box::new(registered.clone()))?;

        let failures = IntCounterVec::new(
            Opts::new(
                "mkp_registration_failures_total",
                "Registration passes aborted by a failing controller unit",
            ),
            &["scope", "mode", "controller"],
        )?;
        registry.register(Box::new(failures.clone()))?;

        let pass_seconds = HistogramVec::new(
            HistogramOpts::new(
                "mkp_registration_pass_seconds",
                "Wall-clock duration of a registration pass",
            )
            .buckets(prometheus::exponential_buckets(0.0005, 2.0, 14)?),
            &["scope", "mode"],
        )?;
        registry.register(Box::new(pass_seconds.clone()))?;

        Ok(Self {
            registry,
            registered,
            failures,
            pass_seconds,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn set_registered(&self, scope: Scope, mode: ActivationMode, count: usize) {
        self.registered
            .with_label_values(&[scope.as_ref(), mode.as_ref()])
            .set(count as i64);
    }

    pub fn record_failure(&self, scope: Scope, mode: ActivationMode, controller: &str) {
        self.failures
            .with_label_values(&[scope.as_ref(), mode.as_ref(), controller])
            .inc();
    }

    pub fn observe_pass(&self, scope: Scope, mode: ActivationMode, seconds: f64) {
        self.pass_seconds
            .with_label_values(&[scope.as_ref(), mode.as_ref()])
            .observe(seconds);
    }
}

pub use prometheus;
