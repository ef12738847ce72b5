use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use tracing::{debug, warn};

use crate::models::balances::{BalanceChange, TokenBalanceChange, TokenStandard};
use crate::models::errors::SimulationError;
use crate::models::simulation::{
    SimulationPayload, SimulationRequest, SimulationResponse, SimulationResponseTransaction,
    SimulationTransaction,
};
use crate::simulator::abi::{IERC20, IERC721, IERC1155};
use crate::simulator::classifier::{execution_failure, is_execution_reverted};
use crate::simulator::transformations::transfers::{SimulationToken, UserTransfer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePhase {
    Before,
    After,
}

/// What each position of the balance simulation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedSlot {
    Read { token: usize, phase: BalancePhase },
    Original,
}

/// Second simulation: balance reads before the original transactions, the
/// originals themselves, then the same reads after. `slots[i]` describes
/// `transactions[i]`, so results are matched back by zipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQueryPlan {
    account: Address,
    tokens: Vec<SimulationToken>,
    slots: Vec<PlannedSlot>,
    transactions: Vec<SimulationTransaction>,
}

impl BalanceQueryPlan {
    pub fn new(request: &SimulationRequest, transfers: &[UserTransfer]) -> Self {
        let account = request.from;
        let mut before = Vec::with_capacity(transfers.len());
        let mut after = Vec::with_capacity(transfers.len());

        for (index, transfer) in transfers.iter().enumerate() {
            let read = balance_read(account, &transfer.token);

            // Nothing to read before a mint
            if !transfer.is_mint {
                before.push((
                    PlannedSlot::Read {
                        token: index,
                        phase: BalancePhase::Before,
                    },
                    read.clone(),
                ));
            }

            after.push((
                PlannedSlot::Read {
                    token: index,
                    phase: BalancePhase::After,
                },
                read,
            ));
        }

        let originals = request.transactions.iter().map(|call| {
            (
                PlannedSlot::Original,
                SimulationTransaction::from_call(account, call),
            )
        });

        let (slots, transactions) = before.into_iter().chain(originals).chain(after).unzip();

        Self {
            account,
            tokens: transfers.iter().map(|transfer| transfer.token).collect(),
            slots,
            transactions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn slots(&self) -> &[PlannedSlot] {
        &self.slots
    }

    pub fn transactions(&self) -> &[SimulationTransaction] {
        &self.transactions
    }

    pub fn payload(&self, request: &SimulationRequest) -> SimulationPayload {
        SimulationPayload {
            transactions: self.transactions.clone(),
            with_call_trace: false,
            with_logs: false,
            overrides: request.overrides.clone(),
        }
    }

    /// Matches the balance simulation's results back onto the planned tokens.
    /// Tokens whose balance did not move are left out.
    pub fn balance_changes(
        &self,
        response: &SimulationResponse,
    ) -> Result<Vec<TokenBalanceChange>, SimulationError> {
        if response.transactions.len() != self.slots.len() {
            warn!(
                "Balance simulation returned {} transactions, expected {}",
                response.transactions.len(),
                self.slots.len()
            );
            return Err(SimulationError::InvalidResponse);
        }

        let mut previous_balances = vec![None; self.tokens.len()];
        let mut new_balances = vec![None; self.tokens.len()];

        for (slot, result) in self.slots.iter().zip(&response.transactions) {
            match *slot {
                PlannedSlot::Original => {
                    if let Some(error) = &result.error {
                        return Err(execution_failure(error));
                    }
                }
                PlannedSlot::Read { token, phase } => {
                    let balance = read_balance(self.account, &self.tokens[token], result)?;
                    match phase {
                        BalancePhase::Before => previous_balances[token] = Some(balance),
                        BalancePhase::After => new_balances[token] = Some(balance),
                    }
                }
            }
        }

        let mut changes = Vec::new();
        for ((token, previous_balance), new_balance) in
            self.tokens.iter().zip(previous_balances).zip(new_balances)
        {
            let new_balance = new_balance.ok_or(SimulationError::InvalidResponse)?;
            // Skipped prior read means the token did not exist yet
            let previous_balance = previous_balance.unwrap_or(U256::ZERO);

            match BalanceChange::between(previous_balance, new_balance) {
                Some(change) => changes.push(TokenBalanceChange {
                    standard: token.standard,
                    address: token.address,
                    id: token.id,
                    change,
                }),
                None => debug!(
                    "Balance of {} token {} unchanged",
                    token.standard, token.address
                ),
            }
        }

        Ok(changes)
    }
}

fn balance_read(account: Address, token: &SimulationToken) -> SimulationTransaction {
    let data = match (token.standard, token.id) {
        (TokenStandard::Erc721, Some(id)) => IERC721::ownerOfCall { tokenId: id }.abi_encode(),
        (TokenStandard::Erc1155, Some(id)) => IERC1155::balanceOfCall { account, id }.abi_encode(),
        _ => IERC20::balanceOfCall { account }.abi_encode(),
    };

    SimulationTransaction {
        from: account,
        to: Some(token.address),
        value: None,
        data: Some(data.into()),
    }
}

fn read_balance(
    account: Address,
    token: &SimulationToken,
    result: &SimulationResponseTransaction,
) -> Result<U256, SimulationError> {
    if token.standard == TokenStandard::Erc721 {
        match &result.error {
            // ownerOf reverts for burned or unminted tokens
            Some(error) if is_execution_reverted(error) => return Ok(U256::ZERO),
            Some(error) => {
                warn!("Owner lookup on {} failed: {}", token.address, error);
                return Err(SimulationError::InvalidResponse);
            }
            None => {}
        }
        let owner = Address::abi_decode(&result.return_value)
            .map_err(|_| SimulationError::InvalidResponse)?;
        let owned = if owner == account { 1 } else { 0 };
        return Ok(U256::from(owned));
    }

    if let Some(error) = &result.error {
        warn!("Balance read on {} failed: {}", token.address, error);
        return Err(SimulationError::InvalidResponse);
    }

    U256::abi_decode(&result.return_value).map_err(|_| SimulationError::InvalidResponse)
}
