use crate::models::balances::{SimulationErrorCode, SimulationErrorData, SimulationErrorKind};
use crate::models::errors::SimulationError;
use crate::models::simulation::SimulationResponse;

/// Reported as a revert, not verbatim.
pub fn is_insufficient_funds_for_gas(message: &str) -> bool {
    message.contains("insufficient funds for gas")
}

pub fn is_execution_reverted(message: &str) -> bool {
    message.contains("execution reverted")
}

/// Per-transaction error string as a pipeline failure.
pub fn execution_failure(message: &str) -> SimulationError {
    if is_execution_reverted(message) {
        SimulationError::Reverted
    } else {
        SimulationError::Execution(message.to_string())
    }
}

/// First per-transaction error reported anywhere in the response.
pub fn check_transaction_errors(response: &SimulationResponse) -> Result<(), SimulationError> {
    match response
        .transactions
        .iter()
        .find_map(|transaction| transaction.error.as_ref())
    {
        Some(error) => Err(execution_failure(error)),
        None => Ok(()),
    }
}

impl From<&SimulationError> for SimulationErrorData {
    fn from(error: &SimulationError) -> Self {
        match error {
            SimulationError::Transport {
                message: Some(message),
                ..
            } if is_insufficient_funds_for_gas(message) => reverted(),
            SimulationError::Transport { code, message } => SimulationErrorData {
                code: code.map(SimulationErrorCode::Rpc),
                message: message.clone(),
            },
            SimulationError::Execution(message) => SimulationErrorData {
                code: None,
                message: Some(message.clone()),
            },
            SimulationError::Reverted => reverted(),
            SimulationError::InvalidResponse => SimulationErrorData {
                code: Some(SimulationErrorCode::Kind(SimulationErrorKind::InvalidResponse)),
                message: Some(SimulationError::InvalidResponse.to_string()),
            },
        }
    }
}

fn reverted() -> SimulationErrorData {
    SimulationErrorData {
        code: Some(SimulationErrorCode::Kind(SimulationErrorKind::Reverted)),
        message: Some(SimulationError::Reverted.to_string()),
    }
}
