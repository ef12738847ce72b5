use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use axum::{Router, http::StatusCode, routing::get};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
use opentelemetry_sdk::metrics::{MetricError, SdkMeterProvider};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;

use crate::models::balances::{SimulationData, SimulationErrorCode};

pub struct Metrics {
    registry: Arc<prometheus::Registry>,
    _provider: SdkMeterProvider,

    // Interpreter outcomes
    pub simulations: Counter<u64>,
    pub simulation_errors: Counter<u64>,
    pub token_balance_changes: Counter<u64>,

    // RPC metrics
    pub rpc_requests: Counter<u64>,
    pub rpc_errors: Counter<u64>,
    pub rpc_latency: Histogram<f64>,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricError> {
        // Create a new prometheus registry
        let registry = prometheus::Registry::new();

        // Configure OpenTelemetry to use this registry
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        // Set up a meter to create instruments
        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("simulation_metrics");

        let simulations = meter
            .u64_counter("simulator_simulations")
            .with_description("Number of simulation requests interpreted")
            .build();

        let simulation_errors = meter
            .u64_counter("simulator_simulation_errors")
            .with_description("Number of simulations reported as failed, by error code")
            .build();

        let token_balance_changes = meter
            .u64_counter("simulator_token_balance_changes")
            .with_description("Number of token balance changes reported")
            .build();

        let rpc_requests = meter
            .u64_counter("simulator_rpc_requests")
            .with_description("Number of simulation API requests made")
            .build();

        let rpc_errors = meter
            .u64_counter("simulator_rpc_errors")
            .with_description("Number of simulation API requests that failed")
            .build();

        let rpc_latency = meter
            .f64_histogram("simulator_rpc_latency")
            .with_description("Simulation API request latency")
            .with_boundaries(vec![
                0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 5.0, 10.0,
            ])
            .with_unit("s")
            .build();

        Ok(Self {
            registry: Arc::new(registry),
            _provider: provider,
            simulations,
            simulation_errors,
            token_balance_changes,
            rpc_requests,
            rpc_errors,
            rpc_latency,
        })
    }

    pub fn record_simulation(&self, chain_id: u64, data: &SimulationData) {
        let chain = KeyValue::new("chain_id", chain_id.to_string());
        self.simulations.add(1, &[chain.clone()]);
        self.token_balance_changes
            .add(data.token_balance_changes().len() as u64, &[chain.clone()]);

        if let Some(error) = data.error() {
            let code = match error.code {
                Some(SimulationErrorCode::Rpc(code)) => code.to_string(),
                Some(SimulationErrorCode::Kind(kind)) => format!("{kind:?}"),
                None => "none".to_string(),
            };
            self.simulation_errors
                .add(1, &[chain, KeyValue::new("code", code)]);
        }
    }

    pub async fn start_metrics_server(&self, addr: &str, port: u16) -> Result<()> {
        let addr = format!("{addr}:{port}")
            .parse::<SocketAddr>()
            .context("invalid metrics address")?;
        let registry = self.registry.clone();

        let app = Router::new().route("/metrics", get(move || metrics_handler(registry.clone())));

        // Determine the access URL based on the binding address. Only used for logging.
        let access_url = if addr.ip().to_string() == "0.0.0.0" {
            format!("http://localhost:{port}/metrics")
        } else {
            format!("http://{}:{port}/metrics", addr.ip())
        };

        info!(
            "Starting metrics server - binding to {} (accessible at {})",
            addr, access_url
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind metrics server")?;

        // Spawn the server in a separate task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server stopped: {}", e);
            }
        });

        Ok(())
    }
}

async fn metrics_handler(registry: Arc<prometheus::Registry>) -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
