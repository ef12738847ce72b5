use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

////////////////////////////////////// Request Data //////////////////////////////////////
// A single call the caller wants simulated on behalf of `from`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

// Per-account state override forwarded to the simulation API
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub nonce: Option<u64>,
}

pub type StateOverrides = BTreeMap<Address, AccountOverride>;

/// Input to the interpreter: what the acting account is about to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(with = "alloy_serde::quantity")]
    pub chain_id: u64,
    pub from: Address,
    pub transactions: Vec<TransactionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<StateOverrides>,
}

// Transaction as submitted to the simulation API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTransaction {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl SimulationTransaction {
    pub fn from_call(from: Address, call: &TransactionCall) -> Self {
        Self {
            from,
            to: call.to,
            value: call.value,
            data: call.data.clone(),
        }
    }
}

// Params object of `infura_simulateTransactions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPayload {
    pub transactions: Vec<SimulationTransaction>,
    pub with_call_trace: bool,
    pub with_logs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<StateOverrides>,
}

////////////////////////////////////// Response Data /////////////////////////////////////
// Log exactly as emitted, undecoded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

// One frame of the nested call tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallTrace {
    #[serde(default)]
    pub calls: Vec<CallTrace>,
    #[serde(default)]
    pub logs: Vec<RawLog>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub nonce: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateDiff {
    #[serde(default)]
    pub pre: BTreeMap<Address, AccountState>,
    #[serde(default)]
    pub post: BTreeMap<Address, AccountState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponseTransaction {
    #[serde(rename = "return", default)]
    pub return_value: Bytes,
    #[serde(default)]
    pub call_trace: CallTrace,
    #[serde(default)]
    pub state_diff: StateDiff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationResponse {
    #[serde(default)]
    pub transactions: Vec<SimulationResponseTransaction>,
}
