use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_transport::TransportError;
use opentelemetry::KeyValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::metrics::Metrics;
use crate::models::common::SimulationConfig;
use crate::models::errors::{ChainError, ConfigError, SimulationError};
use crate::models::simulation::{SimulationPayload, SimulationResponse};
use crate::simulator::SimulationApi;
use crate::utils::strip_html;

const SIMULATE_METHOD: &str = "infura_simulateTransactions";

/// Simulation API reached over JSON-RPC, one endpoint per supported chain.
pub struct RpcSimulationClient {
    providers: HashMap<u64, DynProvider>,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl RpcSimulationClient {
    pub fn from_config(
        config: &SimulationConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self, ConfigError> {
        let mut providers = HashMap::with_capacity(config.chains.len());

        for endpoint in &config.chains {
            let url: Url = endpoint
                .api_url
                .parse()
                .map_err(|_| ConfigError::InvalidApiUrl {
                    chain_id: endpoint.chain_id,
                    url: endpoint.api_url.clone(),
                })?;
            info!("Simulation API for chain {}: {}", endpoint.chain_id, url);

            let provider = ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_http(url)
                .erased();

            if providers.insert(endpoint.chain_id, provider).is_some() {
                return Err(ConfigError::DuplicateChain {
                    chain_id: endpoint.chain_id,
                });
            }
        }

        Ok(Self {
            providers,
            timeout: Duration::from_millis(config.timeout_ms),
            metrics,
        })
    }

    pub fn supports_chain(&self, chain_id: u64) -> bool {
        self.providers.contains_key(&chain_id)
    }

    fn labels(chain_id: u64) -> [KeyValue; 2] {
        [
            KeyValue::new("chain_id", chain_id.to_string()),
            KeyValue::new("method", SIMULATE_METHOD),
        ]
    }
}

impl SimulationApi for RpcSimulationClient {
    async fn simulate(
        &self,
        chain_id: u64,
        payload: &SimulationPayload,
    ) -> Result<SimulationResponse, SimulationError> {
        let provider = self
            .providers
            .get(&chain_id)
            .ok_or(ChainError::UnsupportedChainId { chain_id })?;

        let start = Instant::now();

        // Record metrics if enabled
        if let Some(metrics) = &self.metrics {
            metrics.rpc_requests.add(1, &Self::labels(chain_id));
        }

        debug!(
            "Simulating {} transactions on chain {}",
            payload.transactions.len(),
            chain_id
        );

        let request = provider.raw_request(SIMULATE_METHOD.into(), [payload.clone()]);

        let result: Result<SimulationResponse, SimulationError> =
            match tokio::time::timeout(self.timeout, request).await {
                Ok(result) => result.map_err(transport_failure),
                Err(_) => Err(SimulationError::transport(
                    None,
                    format!(
                        "Simulation request timed out after {}ms",
                        self.timeout.as_millis()
                    ),
                )),
            };

        // Record metrics if enabled
        if let Some(metrics) = &self.metrics {
            metrics
                .rpc_latency
                .record(start.elapsed().as_secs_f64(), &Self::labels(chain_id));

            if result.is_err() {
                metrics.rpc_errors.add(1, &Self::labels(chain_id));
            }
        }

        result.map_err(|e| {
            warn!("Simulation request on chain {} failed: {}", chain_id, e);
            e
        })
    }
}

// JSON-RPC error payloads keep their code; anything else is a bare message
fn transport_failure(error: TransportError) -> SimulationError {
    match error.as_error_resp() {
        Some(payload) => SimulationError::Transport {
            code: Some(payload.code),
            message: Some(payload.message.to_string()),
        },
        None => SimulationError::transport(None, strip_html(&error.to_string())),
    }
}
