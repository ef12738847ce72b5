use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::SolEvent;
use tracing::debug;

use crate::models::balances::TokenStandard;
use crate::models::simulation::RawLog;
use crate::simulator::abi::{IERC20, IERC721, IERC721Legacy, IERC1155, IWrappedNative};

/// Which event schema a log was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferEventKind {
    Erc20,
    Erc20Wrapped,
    Erc721,
    Erc721Legacy,
    Erc1155Single,
    Erc1155Batch,
}

impl TransferEventKind {
    pub fn standard(self) -> TokenStandard {
        match self {
            Self::Erc20 | Self::Erc20Wrapped => TokenStandard::Erc20,
            Self::Erc721 | Self::Erc721Legacy => TokenStandard::Erc721,
            Self::Erc1155Single | Self::Erc1155Batch => TokenStandard::Erc1155,
        }
    }
}

/// A token movement recovered from one log. Wrapped-native deposits have no
/// `from`, withdrawals have no `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub kind: TransferEventKind,
    pub contract_address: Address,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub token_id: Option<U256>,
    pub amount: Option<U256>,
}

impl TransferEvent {
    pub fn involves(&self, account: Address) -> bool {
        self.from == Some(account) || self.to == Some(account)
    }

    pub fn is_mint(&self) -> bool {
        self.from == Some(Address::ZERO)
    }
}

type Decoder = fn(&Log) -> Option<Vec<TransferEvent>>;

// Priority order. ERC-20, ERC-721 and legacy ERC-721 share a topic signature and
// differ only in how many arguments are indexed, so the first match wins.
const DECODERS: [Decoder; 6] = [
    decode_erc20_transfer,
    decode_erc721_transfer,
    decode_erc1155_transfer_single,
    decode_erc1155_transfer_batch,
    decode_wrapped_erc20,
    decode_erc721_legacy_transfer,
];

pub trait TransferEventParser {
    fn parse_transfer_events(&self) -> Vec<TransferEvent>;
}

impl TransferEventParser for [RawLog] {
    // Logs no schema accepts are skipped
    fn parse_transfer_events(&self) -> Vec<TransferEvent> {
        self.iter()
            .filter_map(|raw_log| {
                let events = decode_transfer_event(raw_log);
                if events.is_none() {
                    debug!(
                        "Skipping log from {} with {} topics: no transfer schema matched",
                        raw_log.address,
                        raw_log.topics.len()
                    );
                }
                events
            })
            .flatten()
            .collect()
    }
}

pub fn decode_transfer_event(raw_log: &RawLog) -> Option<Vec<TransferEvent>> {
    let log = Log::new(raw_log.address, raw_log.topics.clone(), raw_log.data.clone())?;
    DECODERS.iter().find_map(|decode| decode(&log))
}

fn decode_event<E: SolEvent>(log: &Log, topic_count: usize) -> Option<E> {
    if log.topics().len() != topic_count || log.topics()[0] != E::SIGNATURE_HASH {
        return None;
    }
    E::decode_log(log).ok().map(|decoded| decoded.data)
}

fn decode_erc20_transfer(log: &Log) -> Option<Vec<TransferEvent>> {
    let event = decode_event::<IERC20::Transfer>(log, 3)?;
    Some(vec![TransferEvent {
        kind: TransferEventKind::Erc20,
        contract_address: log.address,
        from: Some(event.from),
        to: Some(event.to),
        token_id: None,
        amount: Some(event.value),
    }])
}

fn decode_erc721_transfer(log: &Log) -> Option<Vec<TransferEvent>> {
    let event = decode_event::<IERC721::Transfer>(log, 4)?;
    Some(vec![TransferEvent {
        kind: TransferEventKind::Erc721,
        contract_address: log.address,
        from: Some(event.from),
        to: Some(event.to),
        token_id: Some(event.tokenId),
        amount: None,
    }])
}

fn decode_erc1155_transfer_single(log: &Log) -> Option<Vec<TransferEvent>> {
    let event = decode_event::<IERC1155::TransferSingle>(log, 4)?;
    Some(vec![TransferEvent {
        kind: TransferEventKind::Erc1155Single,
        contract_address: log.address,
        from: Some(event.from),
        to: Some(event.to),
        token_id: Some(event.id),
        amount: Some(event.value),
    }])
}

// One event per (id, value) pair
fn decode_erc1155_transfer_batch(log: &Log) -> Option<Vec<TransferEvent>> {
    let event = decode_event::<IERC1155::TransferBatch>(log, 4)?;
    if event.ids.len() != event.values.len() {
        return None;
    }

    Some(
        event
            .ids
            .iter()
            .zip(event.values.iter())
            .map(|(id, value)| TransferEvent {
                kind: TransferEventKind::Erc1155Batch,
                contract_address: log.address,
                from: Some(event.from),
                to: Some(event.to),
                token_id: Some(*id),
                amount: Some(*value),
            })
            .collect(),
    )
}

fn decode_wrapped_erc20(log: &Log) -> Option<Vec<TransferEvent>> {
    if let Some(deposit) = decode_event::<IWrappedNative::Deposit>(log, 2) {
        return Some(vec![TransferEvent {
            kind: TransferEventKind::Erc20Wrapped,
            contract_address: log.address,
            from: None,
            to: Some(deposit.dst),
            token_id: None,
            amount: Some(deposit.wad),
        }]);
    }

    let withdrawal = decode_event::<IWrappedNative::Withdrawal>(log, 2)?;
    Some(vec![TransferEvent {
        kind: TransferEventKind::Erc20Wrapped,
        contract_address: log.address,
        from: Some(withdrawal.src),
        to: None,
        token_id: None,
        amount: Some(withdrawal.wad),
    }])
}

fn decode_erc721_legacy_transfer(log: &Log) -> Option<Vec<TransferEvent>> {
    let event = decode_event::<IERC721Legacy::Transfer>(log, 1)?;
    Some(vec![TransferEvent {
        kind: TransferEventKind::Erc721Legacy,
        contract_address: log.address,
        from: Some(event.from),
        to: Some(event.to),
        token_id: Some(event.tokenId),
        amount: None,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, LogData};

    const TOKEN: Address = Address::repeat_byte(0xaa);
    const ALICE: Address = Address::repeat_byte(0x11);
    const BOB: Address = Address::repeat_byte(0x22);

    fn raw_log(data: LogData) -> RawLog {
        RawLog {
            address: TOKEN,
            topics: data.topics().to_vec(),
            data: data.data,
        }
    }

    fn kinds(raw_log: &RawLog) -> Vec<TransferEventKind> {
        decode_transfer_event(raw_log)
            .unwrap_or_default()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }

    #[test]
    fn shared_transfer_signature_resolves_by_indexed_shape() {
        let erc20 = raw_log(
            IERC20::Transfer {
                from: ALICE,
                to: BOB,
                value: U256::from(7),
            }
            .encode_log_data(),
        );
        let erc721 = raw_log(
            IERC721::Transfer {
                from: ALICE,
                to: BOB,
                tokenId: U256::from(7),
            }
            .encode_log_data(),
        );
        let legacy = raw_log(
            IERC721Legacy::Transfer {
                from: ALICE,
                to: BOB,
                tokenId: U256::from(7),
            }
            .encode_log_data(),
        );

        assert_eq!(erc20.topics[0], erc721.topics[0]);
        assert_eq!(erc20.topics[0], legacy.topics[0]);

        assert_eq!(kinds(&erc20), vec![TransferEventKind::Erc20]);
        assert_eq!(kinds(&erc721), vec![TransferEventKind::Erc721]);
        assert_eq!(kinds(&legacy), vec![TransferEventKind::Erc721Legacy]);
    }

    #[test]
    fn erc20_transfer_carries_amount_without_token_id() {
        let log = raw_log(
            IERC20::Transfer {
                from: ALICE,
                to: BOB,
                value: U256::from(4),
            }
            .encode_log_data(),
        );

        let events = decode_transfer_event(&log).unwrap();

        assert_eq!(
            events,
            vec![TransferEvent {
                kind: TransferEventKind::Erc20,
                contract_address: TOKEN,
                from: Some(ALICE),
                to: Some(BOB),
                token_id: None,
                amount: Some(U256::from(4)),
            }]
        );
    }

    #[test]
    fn transfer_batch_expands_per_token_id() {
        let log = raw_log(
            IERC1155::TransferBatch {
                operator: ALICE,
                from: ALICE,
                to: BOB,
                ids: vec![U256::from(1), U256::from(2)],
                values: vec![U256::from(10), U256::from(20)],
            }
            .encode_log_data(),
        );

        let events = decode_transfer_event(&log).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].token_id, Some(U256::from(1)));
        assert_eq!(events[0].amount, Some(U256::from(10)));
        assert_eq!(events[1].token_id, Some(U256::from(2)));
        assert_eq!(events[1].amount, Some(U256::from(20)));
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TransferEventKind::Erc1155Batch; events.len()]);
        for event in &events {
            assert_eq!((event.from, event.to), (Some(ALICE), Some(BOB)));
        }
    }

    #[test]
    fn wrapped_deposit_and_withdrawal_have_one_sided_parties() {
        let deposit = raw_log(
            IWrappedNative::Deposit {
                dst: ALICE,
                wad: U256::from(3),
            }
            .encode_log_data(),
        );
        let withdrawal = raw_log(
            IWrappedNative::Withdrawal {
                src: ALICE,
                wad: U256::from(3),
            }
            .encode_log_data(),
        );

        let deposit = &decode_transfer_event(&deposit).unwrap()[0];
        let withdrawal = &decode_transfer_event(&withdrawal).unwrap()[0];

        assert_eq!(deposit.kind, TransferEventKind::Erc20Wrapped);
        assert_eq!((deposit.from, deposit.to), (None, Some(ALICE)));
        assert_eq!(withdrawal.kind, TransferEventKind::Erc20Wrapped);
        assert_eq!((withdrawal.from, withdrawal.to), (Some(ALICE), None));
        assert_eq!(withdrawal.kind.standard(), TokenStandard::Erc20);
    }

    #[test]
    fn unknown_logs_are_skipped_without_affecting_neighbours() {
        let unknown = RawLog {
            address: TOKEN,
            topics: vec![B256::repeat_byte(0x42)],
            data: Bytes::new(),
        };
        let truncated = RawLog {
            address: TOKEN,
            topics: vec![IERC20::Transfer::SIGNATURE_HASH],
            data: Bytes::from(vec![0u8; 10]),
        };
        let transfer = raw_log(
            IERC20::Transfer {
                from: ALICE,
                to: BOB,
                value: U256::from(1),
            }
            .encode_log_data(),
        );

        let logs = vec![unknown.clone(), transfer, truncated.clone()];
        let events = logs.parse_transfer_events();

        assert!(decode_transfer_event(&unknown).is_none());
        assert!(decode_transfer_event(&truncated).is_none());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransferEventKind::Erc20);
    }

    #[test]
    fn transfers_from_zero_are_mints_for_every_standard() {
        let mint = TransferEvent {
            kind: TransferEventKind::Erc721,
            contract_address: TOKEN,
            from: Some(Address::ZERO),
            to: Some(ALICE),
            token_id: Some(U256::from(5)),
            amount: None,
        };
        let fungible_mint = TransferEvent {
            kind: TransferEventKind::Erc20,
            token_id: None,
            amount: Some(U256::from(5)),
            ..mint.clone()
        };

        let deposit = TransferEvent {
            kind: TransferEventKind::Erc20Wrapped,
            from: None,
            ..fungible_mint.clone()
        };
        let transfer = TransferEvent {
            from: Some(ALICE),
            ..mint.clone()
        };

        assert!(mint.is_mint());
        assert!(fungible_mint.is_mint());
        assert!(!deposit.is_mint());
        assert!(!transfer.is_mint());
    }
}
