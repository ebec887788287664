use crate::crypto::{Address, Hash};
use crate::transaction::payload::CallFunc;
use primitive_types::U256;

/// Asset identifier of the native coin. Every fee and every ticket is
/// paid in this asset.
pub const SYSTEM_ASSET_ID: Hash = Hash::repeat_byte(0xff);

/// Reserved asset identifier used by notation (USAN) trades. A swap
/// whose from-asset carries this id sells the maker's notation instead
/// of locking funds.
pub const OWNER_USAN_ASSET_ID: Hash = system_key_hash(0xfe);

/// Recipient address of every typed call transaction.
pub const CALL_ADDRESS: Address = Address::repeat_byte(0xff);

/// System accounts hosting the structured-storage registries.
pub const NOTATION_KEY_ADDRESS: Address = system_key_address(0x01);
pub const ASSET_KEY_ADDRESS: Address = system_key_address(0x02);
pub const TICKET_KEY_ADDRESS: Address = system_key_address(0x03);
pub const SWAP_KEY_ADDRESS: Address = system_key_address(0x04);
pub const MULTI_SWAP_KEY_ADDRESS: Address = system_key_address(0x05);
pub const REPORT_KEY_ADDRESS: Address = system_key_address(0x06);

/// Address of the native precompiled contract bridge.
pub const NATIVE_CONTRACT_ADDRESS: Address = Address::repeat_byte(0x99);

/// Fixed gas charged for a call into the native contract bridge.
pub const NATIVE_CONTRACT_GAS: u64 = 20_000;

/// 4-byte dispatch selector of the payable receiveAsset contract
/// entrypoint recognized by the mempool.
pub const RECEIVE_ASSET_SELECTOR: [u8; 4] = [0x94, 0x2d, 0x46, 0x8b];

/// A ticket's start time may lie at most this far past the reference
/// block time.
pub const TICKET_START_WINDOW: u64 = 3 * 600;

/// Reported double-mining headers must be at most this many blocks old.
pub const REPORT_WINDOW: u64 = 100;

const fn system_key_address(tag: u8) -> Address {
    let mut bytes = [0xffu8; 20];
    bytes[19] = tag;
    Address::new(bytes)
}

const fn system_key_hash(tag: u8) -> Hash {
    let mut bytes = [0xffu8; 32];
    bytes[31] = tag;
    Hash::new(bytes)
}

/// One native coin in atomic units (18 decimals).
pub fn coin() -> U256 {
    U256::exp10(18)
}

/// Price of one mining ticket at the given height.
pub fn ticket_price(_height: u64) -> U256 {
    U256::from(5_000u64) * coin()
}

/// Fixed fee charged on top of gas for a typed call, in atomic units
/// of the native coin.
pub fn call_fee(to: &Address, func: CallFunc) -> U256 {
    if *to != CALL_ADDRESS {
        return U256::zero();
    }
    match func {
        CallFunc::GenNotation | CallFunc::GenAsset => coin() / 10,
        CallFunc::TimeLock
        | CallFunc::MakeSwap
        | CallFunc::MakeSwapExt
        | CallFunc::MakeMultiSwap => coin() / 1000,
        _ => U256::zero(),
    }
}

/// A numbered network upgrade activating at a fixed height.
#[derive(Debug, Clone, Copy)]
pub struct HardFork {
    pub id: u8,
    pub height: u64,
}

const HARD_FORKS: &[HardFork] = &[
    HardFork {
        id: 1,
        height: 100_000,
    },
    HardFork {
        id: 2,
        height: 1_200_000,
    },
    HardFork {
        id: 3,
        height: 2_000_000,
    },
];

/// Whether the numbered fork is active at the given height.
pub fn is_hard_fork(id: u8, height: u64) -> bool {
    HARD_FORKS
        .iter()
        .any(|fork| fork.id == id && height >= fork.height)
}

/// Activation height of the numbered fork.
pub fn hard_fork_height(id: u8) -> Option<u64> {
    HARD_FORKS
        .iter()
        .find(|fork| fork.id == id)
        .map(|fork| fork.height)
}

/// Fork 3 introduced the smart transfer lock type.
pub fn is_smart_transfer_enabled(height: u64) -> bool {
    is_hard_fork(3, height)
}

/// Fork 2 started enforcing swap target lists.
pub fn is_private_swap_checking_enabled(height: u64) -> bool {
    is_hard_fork(2, height)
}

/// Fork 2 enabled double-mining reports.
pub fn is_report_enabled(height: u64) -> bool {
    is_hard_fork(2, height)
}

/// Accounts drained into the refund address when fork 1 activates.
pub const VOTE1_DRAIN_LIST: &[Address] = &[
    Address::new([
        0x33, 0x3e, 0xc1, 0x05, 0x9b, 0x37, 0xf8, 0x5a, 0x1f, 0x77, 0x0c, 0x30, 0x1f, 0x3a, 0x0a,
        0x2a, 0x55, 0x8e, 0xc9, 0xf4,
    ]),
    Address::new([
        0x8e, 0x01, 0xc4, 0x7d, 0x94, 0x62, 0x0f, 0x1e, 0x75, 0xb2, 0xaa, 0x97, 0x27, 0x1b, 0xa8,
        0x14, 0x2f, 0x0c, 0x01, 0x76,
    ]),
];

/// Receiver of the drained fork-1 balances.
pub const VOTE1_REFUND_ADDRESS: Address = Address::new([
    0xf4, 0x2a, 0x33, 0x9e, 0xf8, 0x5d, 0x2e, 0xa3, 0x11, 0x00, 0x29, 0x74, 0x2b, 0x8d, 0x6c,
    0x98, 0x24, 0x2e, 0x1c, 0x50,
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_addresses_distinct() {
        let addrs = [
            CALL_ADDRESS,
            NOTATION_KEY_ADDRESS,
            ASSET_KEY_ADDRESS,
            TICKET_KEY_ADDRESS,
            SWAP_KEY_ADDRESS,
            MULTI_SWAP_KEY_ADDRESS,
            REPORT_KEY_ADDRESS,
            NATIVE_CONTRACT_ADDRESS,
        ];
        for (i, a) in addrs.iter().enumerate() {
            for b in addrs.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_fork_predicates() {
        assert!(!is_hard_fork(2, 1_199_999));
        assert!(is_hard_fork(2, 1_200_000));
        assert!(is_report_enabled(1_200_000));
        assert!(!is_smart_transfer_enabled(1_999_999));
        assert!(is_smart_transfer_enabled(2_000_000));
    }

    #[test]
    fn test_ticket_price_constant_over_heights() {
        assert_eq!(ticket_price(0), ticket_price(10_000_000));
        assert_eq!(ticket_price(0), U256::from(5_000u64) * coin());
    }
}
