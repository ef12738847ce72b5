use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token standard reported to callers. Event variants (wrapped, legacy,
/// batch) collapse onto these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStandard {
    Erc20,
    Erc721,
    Erc1155,
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erc20 => write!(f, "erc20"),
            Self::Erc721 => write!(f, "erc721"),
            Self::Erc1155 => write!(f, "erc1155"),
        }
    }
}

/// Signed change of an unsigned balance, stored as magnitude plus direction.
///
/// `difference == |new_balance - previous_balance|` and `is_decrease` is set
/// only when the balance went down. Never constructed for an unchanged balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    pub previous_balance: U256,
    pub new_balance: U256,
    pub difference: U256,
    pub is_decrease: bool,
}

impl BalanceChange {
    /// Returns `None` when both balances are equal.
    pub fn between(previous_balance: U256, new_balance: U256) -> Option<Self> {
        if previous_balance == new_balance {
            return None;
        }

        let is_decrease = new_balance < previous_balance;
        let difference = if is_decrease {
            previous_balance - new_balance
        } else {
            new_balance - previous_balance
        };

        Some(Self {
            previous_balance,
            new_balance,
            difference,
            is_decrease,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceChange {
    pub standard: TokenStandard,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<U256>,
    #[serde(flatten)]
    pub change: BalanceChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationErrorKind {
    Reverted,
    InvalidResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimulationErrorCode {
    Rpc(i64),
    Kind(SimulationErrorKind),
}

/// Error as surfaced in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationErrorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<SimulationErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Final report: either the balance changes or the error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SimulationData {
    #[serde(rename_all = "camelCase")]
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        native_balance_change: Option<BalanceChange>,
        token_balance_changes: Vec<TokenBalanceChange>,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        error: SimulationErrorData,
        token_balance_changes: Vec<TokenBalanceChange>,
    },
}

impl SimulationData {
    pub fn success(
        native_balance_change: Option<BalanceChange>,
        token_balance_changes: Vec<TokenBalanceChange>,
    ) -> Self {
        Self::Success {
            native_balance_change,
            token_balance_changes,
        }
    }

    pub fn failure(error: SimulationErrorData) -> Self {
        Self::Failure {
            error,
            token_balance_changes: Vec::new(),
        }
    }

    pub fn native_balance_change(&self) -> Option<&BalanceChange> {
        match self {
            Self::Success {
                native_balance_change,
                ..
            } => native_balance_change.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn token_balance_changes(&self) -> &[TokenBalanceChange] {
        match self {
            Self::Success {
                token_balance_changes,
                ..
            }
            | Self::Failure {
                token_balance_changes,
                ..
            } => token_balance_changes,
        }
    }

    pub fn error(&self) -> Option<&SimulationErrorData> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}
