use thiserror::Error;

/// Failures that terminate one interpreter invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Simulation request failed: {}", .message.as_deref().unwrap_or("unknown error"))]
    Transport {
        code: Option<i64>,
        message: Option<String>,
    },
    #[error("Simulated transaction failed: {0}")]
    Execution(String),
    #[error("Transaction was reverted")]
    Reverted,
    #[error("Invalid response from simulation API")]
    InvalidResponse,
}

impl SimulationError {
    pub fn transport(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Transport {
            code,
            message: Some(message.into()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Unsupported chain ID: {chain_id}")]
    UnsupportedChainId { chain_id: u64 },
}

impl From<ChainError> for SimulationError {
    fn from(err: ChainError) -> Self {
        SimulationError::transport(None, err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid API URL for chain {chain_id}: {url}")]
    InvalidApiUrl { chain_id: u64, url: String },
    #[error("Duplicate API endpoint for chain {chain_id}")]
    DuplicateChain { chain_id: u64 },
}
