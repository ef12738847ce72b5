use anyhow::{Context, Result, anyhow};
use axum::{Json, Router, extract::State, routing::post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

use simulation_interpreter::metrics::Metrics;
use simulation_interpreter::models::balances::SimulationData;
use simulation_interpreter::models::simulation::SimulationRequest;
use simulation_interpreter::simulator::get_simulation_data;
use simulation_interpreter::simulator::rpc::client::RpcSimulationClient;
use simulation_interpreter::utils::load_config;

#[derive(Clone)]
struct AppState {
    client: Arc<RpcSimulationClient>,
    metrics: Option<Arc<Metrics>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!();
    info!("=========================== INITIALIZING ===========================");

    // Load config
    let config = match load_config("config.yml") {
        Ok(config) => {
            info!("Config loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(anyhow!(e));
        }
    };

    // Initialize optional metrics
    let metrics = if config.metrics.enabled {
        Some(Arc::new(Metrics::new()?))
    } else {
        info!("Metrics are disabled");
        None
    };

    // Start metrics server if metrics are enabled
    if let Some(metrics_instance) = &metrics {
        metrics_instance
            .start_metrics_server(&config.metrics.address, config.metrics.port)
            .await?;
    }

    // One simulation API provider per configured chain
    let client = RpcSimulationClient::from_config(&config.simulation, metrics.clone())?;

    let state = AppState {
        client: Arc::new(client),
        metrics,
    };

    let app = Router::new()
        .route("/simulate", post(simulate))
        .with_state(state);

    let addr = format!("{}:{}", config.server.address, config.server.port)
        .parse::<SocketAddr>()
        .context("invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!();
    info!("======================== STARTING SIMULATOR ========================");
    info!("Serving simulations on http://{}/simulate", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received Ctrl+C signal, initiating shutdown...");
            }
        })
        .await?;

    Ok(())
}

async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> Json<SimulationData> {
    info!(
        "Simulating {} transactions from {} on chain {}",
        request.transactions.len(),
        request.from,
        request.chain_id
    );

    let data = get_simulation_data(state.client.as_ref(), &request).await;

    if let Some(metrics) = &state.metrics {
        metrics.record_simulation(request.chain_id, &data);
    }

    Json(data)
}
