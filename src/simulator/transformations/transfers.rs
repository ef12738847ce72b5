use alloy_primitives::{Address, U256};
use std::collections::HashSet;

use crate::models::balances::TokenStandard;
use crate::simulator::rpc::logs::{TransferEvent, TransferEventKind};

/// A (contract, token id) pair whose balance the acting account should have
/// read before and after the simulated transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationToken {
    pub standard: TokenStandard,
    pub address: Address,
    pub id: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTransfer {
    pub token: SimulationToken,
    pub kind: TransferEventKind,
    pub is_mint: bool,
}

impl From<&TransferEvent> for UserTransfer {
    fn from(event: &TransferEvent) -> Self {
        Self {
            token: SimulationToken {
                standard: event.kind.standard(),
                address: event.contract_address,
                id: event.token_id,
            },
            kind: event.kind,
            is_mint: event.is_mint(),
        }
    }
}

pub trait UserTransferFilter {
    fn user_transfers(&self, account: Address) -> Vec<UserTransfer>;
}

impl UserTransferFilter for [TransferEvent] {
    // Keyed by (contract, token id); fungible transfers on one contract collapse
    // into a single entry since only the net balance is read back.
    fn user_transfers(&self, account: Address) -> Vec<UserTransfer> {
        let mut seen = HashSet::new();
        let mut transfers = Vec::new();

        for event in self.iter().filter(|event| event.involves(account)) {
            if seen.insert((event.contract_address, event.token_id)) {
                transfers.push(UserTransfer::from(event));
            }
        }

        transfers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: Address = Address::repeat_byte(0x12);
    const OTHER: Address = Address::repeat_byte(0x45);

    fn event(
        kind: TransferEventKind,
        contract: u8,
        from: Address,
        to: Address,
        id: Option<u64>,
    ) -> TransferEvent {
        TransferEvent {
            kind,
            contract_address: Address::repeat_byte(contract),
            from: Some(from),
            to: Some(to),
            token_id: id.map(U256::from),
            amount: Some(U256::from(1)),
        }
    }

    #[test]
    fn drops_transfers_not_involving_account() {
        let events = vec![
            event(TransferEventKind::Erc20, 1, OTHER, OTHER, None),
            event(TransferEventKind::Erc20, 2, OTHER, USER, None),
            event(TransferEventKind::Erc20, 3, USER, OTHER, None),
        ];

        let transfers = events.user_transfers(USER);

        assert_eq!(
            transfers.iter().map(|t| t.token.address).collect::<Vec<_>>(),
            vec![Address::repeat_byte(2), Address::repeat_byte(3)]
        );
    }

    #[test]
    fn collapses_fungible_transfers_on_one_contract_keeping_first_order() {
        let events = vec![
            event(TransferEventKind::Erc20, 7, OTHER, USER, None),
            event(TransferEventKind::Erc721, 8, OTHER, USER, Some(5)),
            event(TransferEventKind::Erc20, 7, USER, OTHER, None),
            event(TransferEventKind::Erc721, 8, OTHER, USER, Some(6)),
            event(TransferEventKind::Erc721, 8, USER, OTHER, Some(5)),
        ];

        let tokens: Vec<_> = events
            .user_transfers(USER)
            .into_iter()
            .map(|t| (t.token.address, t.token.id))
            .collect();

        assert_eq!(
            tokens,
            vec![
                (Address::repeat_byte(7), None),
                (Address::repeat_byte(8), Some(U256::from(5))),
                (Address::repeat_byte(8), Some(U256::from(6))),
            ]
        );
    }

    #[test]
    fn marks_mints_of_any_standard() {
        let events = vec![
            event(TransferEventKind::Erc721, 8, Address::ZERO, USER, Some(5)),
            event(TransferEventKind::Erc20, 9, Address::ZERO, USER, None),
            event(TransferEventKind::Erc1155Single, 10, OTHER, USER, Some(5)),
        ];

        let transfers = events.user_transfers(USER);

        assert!(transfers[0].is_mint);
        assert_eq!(transfers[0].token.standard, TokenStandard::Erc721);
        assert!(transfers[1].is_mint);
        assert!(!transfers[2].is_mint);
    }
}
