pub mod abi;
pub mod classifier;
pub mod rpc;
pub mod transformations;

use std::future::Future;
use tracing::{debug, warn};

use crate::models::balances::{SimulationData, SimulationErrorData};
use crate::models::errors::SimulationError;
use crate::models::simulation::{
    SimulationPayload, SimulationRequest, SimulationResponse, SimulationTransaction,
};
use crate::simulator::classifier::check_transaction_errors;
use crate::simulator::rpc::{logs::TransferEventParser, traces::LogExtractor};
use crate::simulator::transformations::{
    balances::BalanceQueryPlan, native::NativeBalanceReader, transfers::UserTransferFilter,
};

/// Executes transactions speculatively against current chain state.
pub trait SimulationApi {
    fn simulate(
        &self,
        chain_id: u64,
        payload: &SimulationPayload,
    ) -> impl Future<Output = Result<SimulationResponse, SimulationError>> + Send;
}

/// Simulates the request and reports how the sender's native and token
/// balances would change, or why the simulation failed.
///
/// Issues at most two simulation calls: the request itself with call traces,
/// then balance reads wrapped around it for every token the sender touched.
pub async fn get_simulation_data<A: SimulationApi>(
    api: &A,
    request: &SimulationRequest,
) -> SimulationData {
    match simulate_balance_changes(api, request).await {
        Ok(data) => data,
        Err(e) => {
            warn!(
                "Simulation for {} on chain {} failed: {}",
                request.from, request.chain_id, e
            );
            SimulationData::failure(SimulationErrorData::from(&e))
        }
    }
}

async fn simulate_balance_changes<A: SimulationApi>(
    api: &A,
    request: &SimulationRequest,
) -> Result<SimulationData, SimulationError> {
    let response = api
        .simulate(request.chain_id, &trace_payload(request))
        .await?;
    check_transaction_errors(&response)?;

    let native_balance_change = response.native_balance_change(request.from);

    let logs = response.extract_logs();
    let events = logs.parse_transfer_events();
    let transfers = events.user_transfers(request.from);
    debug!(
        "Decoded {} transfer events from {} logs, {} affecting {}",
        events.len(),
        logs.len(),
        transfers.len(),
        request.from
    );

    let plan = BalanceQueryPlan::new(request, &transfers);
    let token_balance_changes = if plan.is_empty() {
        Vec::new()
    } else {
        let response = api
            .simulate(request.chain_id, &plan.payload(request))
            .await?;
        plan.balance_changes(&response)?
    };

    Ok(SimulationData::success(
        native_balance_change,
        token_balance_changes,
    ))
}

fn trace_payload(request: &SimulationRequest) -> SimulationPayload {
    SimulationPayload {
        transactions: request
            .transactions
            .iter()
            .map(|call| SimulationTransaction::from_call(request.from, call))
            .collect(),
        with_call_trace: true,
        with_logs: true,
        overrides: request.overrides.clone(),
    }
}
