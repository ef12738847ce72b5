use alloy_primitives::Address;

use crate::models::balances::BalanceChange;
use crate::models::simulation::SimulationResponse;

pub trait NativeBalanceReader {
    fn native_balance_change(&self, account: Address) -> Option<BalanceChange>;
}

impl NativeBalanceReader for SimulationResponse {
    // Balance before the first simulated transaction touching the account and
    // after the last one
    fn native_balance_change(&self, account: Address) -> Option<BalanceChange> {
        let previous_balance = self
            .transactions
            .iter()
            .find_map(|transaction| transaction.state_diff.pre.get(&account)?.balance)?;
        let new_balance = self
            .transactions
            .iter()
            .rev()
            .find_map(|transaction| transaction.state_diff.post.get(&account)?.balance)?;

        BalanceChange::between(previous_balance, new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::simulation::{AccountState, SimulationResponseTransaction, StateDiff};
    use alloy_primitives::U256;

    const USER: Address = Address::repeat_byte(0x12);

    fn with_balances(pre: Option<u64>, post: Option<u64>) -> SimulationResponseTransaction {
        let mut state_diff = StateDiff::default();
        if let Some(balance) = pre {
            state_diff.pre.insert(
                USER,
                AccountState {
                    balance: Some(U256::from(balance)),
                    nonce: None,
                },
            );
        }
        if let Some(balance) = post {
            state_diff.post.insert(
                USER,
                AccountState {
                    balance: Some(U256::from(balance)),
                    nonce: None,
                },
            );
        }
        SimulationResponseTransaction {
            state_diff,
            ..Default::default()
        }
    }

    #[test]
    fn spans_first_pre_to_last_post() {
        let response = SimulationResponse {
            transactions: vec![
                with_balances(Some(10), Some(8)),
                with_balances(None, None),
                with_balances(Some(8), Some(3)),
            ],
        };

        let change = response.native_balance_change(USER).unwrap();

        assert_eq!(change.previous_balance, U256::from(10));
        assert_eq!(change.new_balance, U256::from(3));
        assert_eq!(change.difference, U256::from(7));
        assert!(change.is_decrease);
    }

    #[test]
    fn absent_when_unchanged_or_missing() {
        let unchanged = SimulationResponse {
            transactions: vec![with_balances(Some(0), Some(0))],
        };
        let missing = SimulationResponse {
            transactions: vec![with_balances(Some(1), None)],
        };

        assert_eq!(unchanged.native_balance_change(USER), None);
        assert_eq!(missing.native_balance_change(USER), None);
        assert_eq!(
            SimulationResponse::default().native_balance_change(USER),
            None
        );
    }
}
