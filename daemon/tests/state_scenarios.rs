//! End-to-end scenarios driving the dispatcher against a fresh state:
//! time-lock conversions with surplus refunds, ticket purchases, swap
//! lifecycles, notation trades and double-mining reports.

use primitive_types::U256;
use tempo_common::asset::Asset;
use tempo_common::block::BlockHeader;
use tempo_common::config::{
    hard_fork_height, ticket_price, CALL_ADDRESS, OWNER_USAN_ASSET_ID, SYSTEM_ASSET_ID,
};
use tempo_common::crypto::{Address, Hash};
use tempo_common::swap::Swap;
use tempo_common::ticket::{ticket_id, TicketBody};
use tempo_common::timelock::{
    new_time_lock, TimeLock, TimeLockItem, TIMELOCK_FOREVER, TIMELOCK_NOW,
};
use tempo_common::transaction::payload::{
    AssetValueChangeParam, BuyTicketParam, CallFunc, CallParam, LockType, MakeSwapParam,
    RecallSwapParam, TakeSwapParam, TimeLockParam,
};
use tempo_common::transaction::Transaction;
use tempo_daemon::core::error::BlockchainError;
use tempo_daemon::core::execute::{apply_native_call, execute_native_call, BlockEnv};
use tempo_daemon::core::report::encode_report;
use tempo_daemon::core::state::StateDB;

const ALICE: Address = Address::repeat_byte(0x0a);
const BOB: Address = Address::repeat_byte(0x0b);
const CAROL: Address = Address::repeat_byte(0x0c);

fn env(number: u64, timestamp: u64) -> BlockEnv {
    BlockEnv {
        number,
        timestamp,
        parent_hash: Hash::repeat_byte(0x77),
    }
}

fn call_tx(nonce: u64, func: CallFunc, data: Vec<u8>) -> Transaction {
    let param = CallParam { func, data };
    Transaction {
        nonce,
        gas_price: U256::zero(),
        gas_limit: 0,
        to: Some(CALL_ADDRESS),
        value: U256::zero(),
        data: rlp::encode(&param).to_vec(),
    }
}

fn lock(items: &[(u64, u64, U256)]) -> TimeLock {
    TimeLock::from_items(
        items
            .iter()
            .map(|(s, e, v)| TimeLockItem::new(*s, *e, *v))
            .collect(),
    )
}

fn register_asset(state: &mut StateDB, id_byte: u8, owner: Address, total: u64) -> Hash {
    let id = Hash::repeat_byte(id_byte);
    state
        .gen_asset(Asset {
            id,
            owner,
            name: format!("asset-{id_byte}"),
            symbol: "AST".to_string(),
            decimals: 18,
            total: U256::from(total),
            can_change: true,
            description: String::new(),
        })
        .expect("registered");
    state.add_balance(&owner, &id, U256::from(total));
    id
}

/// S1: converting balance into a future time lock refunds the
/// complement of the window to the sender.
#[test]
fn asset_to_time_lock_refunds_surplus() {
    let mut state = StateDB::new();
    state.add_balance(&ALICE, &SYSTEM_ASSET_ID, U256::from(100u64));

    let p = TimeLockParam {
        lock_type: LockType::AssetToTimeLock,
        asset_id: SYSTEM_ASSET_ID,
        to: BOB,
        start_time: 1_000,
        end_time: 2_000,
        value: U256::from(40u64),
    };
    let tx = call_tx(0, CallFunc::TimeLock, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), ALICE, &tx).expect("applied");

    assert_eq!(
        state.get_balance(&SYSTEM_ASSET_ID, &ALICE),
        U256::from(60u64)
    );
    assert_eq!(
        state.get_timelock_balance(&SYSTEM_ASSET_ID, &ALICE),
        lock(&[
            (500, 999, U256::from(40u64)),
            (2_001, TIMELOCK_FOREVER, U256::from(40u64)),
        ])
    );
    assert_eq!(
        state.get_timelock_balance(&SYSTEM_ASSET_ID, &BOB),
        lock(&[(1_000, 2_000, U256::from(40u64))])
    );
}

/// S2: buying a ticket from plain balance burns the price and leaves
/// the conversion surplus around the ticket's epoch.
#[test]
fn buy_ticket_via_balance() {
    let mut state = StateDB::new();
    let price = ticket_price(10);
    state.add_balance(&ALICE, &SYSTEM_ASSET_ID, price * 5);

    let p = BuyTicketParam {
        start: 2_000,
        end: 5_000,
    };
    let tx = call_tx(0, CallFunc::BuyTicket, rlp::encode(&p).to_vec());
    let block = env(10, 1_000);
    apply_native_call(&mut state, &block, ALICE, &tx).expect("applied");

    assert_eq!(state.get_balance(&SYSTEM_ASSET_ID, &ALICE), price * 4);
    assert_eq!(
        state.get_timelock_balance(&SYSTEM_ASSET_ID, &ALICE),
        lock(&[(1_000, 1_999, price), (5_001, TIMELOCK_FOREVER, price)])
    );

    let id = ticket_id(&ALICE, &block.parent_hash);
    assert!(state.is_ticket_exist(&id));
    let ticket = state.get_ticket(&id).expect("found");
    assert_eq!(ticket.owner, ALICE);
    assert_eq!(ticket.body.expire_time, 5_000);

    // a second purchase in the same block collides on the ticket id
    let tx = call_tx(1, CallFunc::BuyTicket, rlp::encode(&p).to_vec());
    let err = apply_native_call(&mut state, &block, ALICE, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::Ticket(_)));
}

/// S3: the legacy maker never tops a time-lock leg up from balance;
/// the Ext variant does and refunds the surplus.
#[test]
fn make_swap_legacy_vs_ext() {
    let mut state = StateDB::new();
    let to_asset = register_asset(&mut state, 0x30, CAROL, 1_000);
    let from_asset = register_asset(&mut state, 0x31, ALICE, 1_000);

    let p = MakeSwapParam {
        from_asset_id: from_asset,
        from_start_time: 1_000,
        from_end_time: 2_000,
        min_from_amount: U256::from(10u64),
        to_asset_id: to_asset,
        to_start_time: TIMELOCK_NOW,
        to_end_time: TIMELOCK_FOREVER,
        min_to_amount: U256::from(20u64),
        swap_size: U256::from(5u64),
        targets: vec![],
        time: 500,
        description: String::new(),
    };

    // Alice holds only plain balance, and the from leg is a window
    let legacy = call_tx(0, CallFunc::MakeSwap, rlp::encode(&p).to_vec());
    let err = apply_native_call(&mut state, &env(10, 500), ALICE, &legacy).unwrap_err();
    assert!(matches!(
        err,
        BlockchainError::InsufficientTimeLockBalance
    ));

    let ext = call_tx(1, CallFunc::MakeSwapExt, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), ALICE, &ext).expect("applied");

    // 50 units were converted, the window escrowed, the rest refunded
    assert_eq!(state.get_balance(&from_asset, &ALICE), U256::from(950u64));
    assert_eq!(
        state.get_timelock_balance(&from_asset, &ALICE),
        lock(&[
            (500, 999, U256::from(50u64)),
            (2_001, TIMELOCK_FOREVER, U256::from(50u64)),
        ])
    );
    assert!(state.get_swap(&ext.hash()).is_ok());
}

/// S4: a partial take decrements the remaining size and settles both
/// legs for the taken lots only.
#[test]
fn take_swap_partial_fill() {
    let mut state = StateDB::new();
    let height = hard_fork_height(2).expect("configured") + 10;
    let ts = 500u64;

    let to_asset = register_asset(&mut state, 0x40, BOB, 1_000);
    let from_asset = register_asset(&mut state, 0x41, ALICE, 1_000);

    let p = MakeSwapParam {
        from_asset_id: from_asset,
        from_start_time: TIMELOCK_NOW,
        from_end_time: TIMELOCK_FOREVER,
        min_from_amount: U256::from(10u64),
        to_asset_id: to_asset,
        to_start_time: TIMELOCK_NOW,
        to_end_time: TIMELOCK_FOREVER,
        min_to_amount: U256::from(20u64),
        swap_size: U256::from(10u64),
        targets: vec![],
        time: ts,
        description: String::new(),
    };
    let make = call_tx(0, CallFunc::MakeSwap, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(height, ts), ALICE, &make).expect("made");
    let swap_id = make.hash();

    // the full escrow left the maker up front
    assert_eq!(state.get_balance(&from_asset, &ALICE), U256::from(900u64));

    let take = TakeSwapParam {
        swap_id,
        size: U256::from(3u64),
    };
    let tx = call_tx(0, CallFunc::TakeSwap, rlp::encode(&take).to_vec());
    apply_native_call(&mut state, &env(height, ts), BOB, &tx).expect("taken");

    let swap = state.get_swap(&swap_id).expect("still open");
    assert_eq!(swap.swap_size, U256::from(7u64));
    // owner received 3 lots of the to asset
    assert_eq!(state.get_balance(&to_asset, &ALICE), U256::from(60u64));
    // taker paid 60 and received 3 lots of the from asset
    assert_eq!(state.get_balance(&to_asset, &BOB), U256::from(940u64));
    assert_eq!(state.get_balance(&from_asset, &BOB), U256::from(30u64));
}

/// S5: an admitted double-mining report deletes every ticket of the
/// offender and records the report.
#[test]
fn report_illegal_deletes_offender_tickets() {
    let mut state = StateDB::new();
    let height = hard_fork_height(2).expect("configured") + 50;
    let offender = Address::repeat_byte(0x66);

    for id_byte in [0xb1u8, 0xb2] {
        state
            .add_ticket(
                offender,
                TicketBody {
                    id: Hash::repeat_byte(id_byte),
                    height: height - 20,
                    start_time: 0,
                    expire_time: u64::MAX,
                },
            )
            .expect("added");
    }
    state
        .add_ticket(
            BOB,
            TicketBody {
                id: Hash::repeat_byte(0xb3),
                height: height - 20,
                start_time: 0,
                expire_time: u64::MAX,
            },
        )
        .expect("added");

    let h1 = BlockHeader {
        parent_hash: Hash::repeat_byte(0x01),
        miner: offender,
        number: height - 5,
        time: 900,
        extra: vec![1],
    };
    let h2 = BlockHeader {
        extra: vec![2],
        ..h1.clone()
    };
    let report = encode_report(&h1, &h2);

    let tx = call_tx(0, CallFunc::ReportIllegal, report.clone());
    apply_native_call(&mut state, &env(height, 1_000), ALICE, &tx).expect("processed");

    assert_eq!(state.total_number_of_tickets(), 1);
    assert!(state.is_ticket_exist(&Hash::repeat_byte(0xb3)));
    assert!(state.is_report_exist(&report));

    let last_log = state.logs().last().expect("log emitted");
    let text = String::from_utf8(last_log.data.clone()).expect("json");
    assert!(text.contains("DeleteTickets"));

    // replaying the same report is rejected
    let tx = call_tx(1, CallFunc::ReportIllegal, report);
    let err = apply_native_call(&mut state, &env(height, 1_000), ALICE, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::ReportExists));
}

/// S6: taking a USAN swap moves the notation instead of funds.
#[test]
fn usan_swap_transfers_notation() {
    let mut state = StateDB::new();
    let height = hard_fork_height(2).expect("configured") + 10;
    let ts = 500u64;

    let to_asset = register_asset(&mut state, 0x50, BOB, 1_000);
    state.gen_notation(&ALICE).expect("notation");
    let notation = state.get_notation(&ALICE);

    let p = MakeSwapParam {
        from_asset_id: OWNER_USAN_ASSET_ID,
        from_start_time: TIMELOCK_NOW,
        from_end_time: TIMELOCK_FOREVER,
        min_from_amount: U256::one(),
        to_asset_id: to_asset,
        to_start_time: TIMELOCK_NOW,
        to_end_time: TIMELOCK_FOREVER,
        min_to_amount: U256::from(25u64),
        swap_size: U256::one(),
        targets: vec![],
        time: ts,
        description: String::new(),
    };
    let make = call_tx(0, CallFunc::MakeSwap, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(height, ts), ALICE, &make).expect("made");

    let take = TakeSwapParam {
        swap_id: make.hash(),
        size: U256::one(),
    };
    let tx = call_tx(0, CallFunc::TakeSwap, rlp::encode(&take).to_vec());
    apply_native_call(&mut state, &env(height, ts), BOB, &tx).expect("taken");

    assert_eq!(state.get_notation(&ALICE), 0);
    assert_eq!(state.get_notation(&BOB), notation);
    assert_eq!(
        state.get_address_by_notation(notation).expect("resolves"),
        BOB
    );
    // the owner was paid in the to asset
    assert_eq!(state.get_balance(&to_asset, &ALICE), U256::from(25u64));
    assert_eq!(state.get_balance(&to_asset, &BOB), U256::from(975u64));
    // the swap is fully consumed
    assert!(state.get_swap(&make.hash()).is_err());
}

/// Recalling a swap restores the maker's holdings exactly.
#[test]
fn recall_swap_restores_maker() {
    let mut state = StateDB::new();
    let ts = 500u64;
    let to_asset = register_asset(&mut state, 0x60, BOB, 1_000);
    let from_asset = register_asset(&mut state, 0x61, ALICE, 1_000);

    // seed the maker with a time lock that covers the from leg
    let seed = new_time_lock(U256::from(200u64), 400, 3_000).expect("valid");
    state.add_timelock_balance(&ALICE, &from_asset, &seed, 1, ts);

    let balance_before = state.get_balance(&from_asset, &ALICE);
    let lock_before = state.get_timelock_balance(&from_asset, &ALICE);

    let p = MakeSwapParam {
        from_asset_id: from_asset,
        from_start_time: 1_000,
        from_end_time: 2_000,
        min_from_amount: U256::from(10u64),
        to_asset_id: to_asset,
        to_start_time: TIMELOCK_NOW,
        to_end_time: TIMELOCK_FOREVER,
        min_to_amount: U256::from(20u64),
        swap_size: U256::from(5u64),
        targets: vec![],
        time: ts,
        description: String::new(),
    };
    let make = call_tx(0, CallFunc::MakeSwap, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, ts), ALICE, &make).expect("made");
    assert_ne!(
        state.get_timelock_balance(&from_asset, &ALICE),
        lock_before
    );

    let recall = RecallSwapParam {
        swap_id: make.hash(),
    };
    let tx = call_tx(1, CallFunc::RecallSwap, rlp::encode(&recall).to_vec());
    apply_native_call(&mut state, &env(10, ts), ALICE, &tx).expect("recalled");

    assert_eq!(state.get_balance(&from_asset, &ALICE), balance_before);
    assert_eq!(state.get_timelock_balance(&from_asset, &ALICE), lock_before);
    assert!(state.get_swap(&make.hash()).is_err());

    // only the owner could have recalled
    let tx = call_tx(2, CallFunc::RecallSwap, rlp::encode(&recall).to_vec());
    let err = apply_native_call(&mut state, &env(10, ts), BOB, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::SwapNotFound(_)));
}

/// Send and time-lock operations conserve the per-asset total of
/// balance plus locked value across the touched accounts.
#[test]
fn transfers_conserve_total_value() {
    let mut state = StateDB::new();
    state.add_balance(&ALICE, &SYSTEM_ASSET_ID, U256::from(1_000u64));

    // at any fixed instant, balance plus the value usable at that
    // instant is conserved by sends and lock conversions
    let total_at = |state: &StateDB, t: u64| -> U256 {
        let mut sum = U256::zero();
        for addr in [ALICE, BOB, CAROL] {
            sum += state.get_balance(&SYSTEM_ASSET_ID, &addr);
            sum += state
                .get_timelock_balance(&SYSTEM_ASSET_ID, &addr)
                .get_spendable_value(t, t);
        }
        sum
    };
    let instants = [600u64, 1_500, 2_500, 1_000_000];
    let before: Vec<U256> = instants.iter().map(|t| total_at(&state, *t)).collect();

    let p = TimeLockParam {
        lock_type: LockType::AssetToTimeLock,
        asset_id: SYSTEM_ASSET_ID,
        to: BOB,
        start_time: 1_000,
        end_time: 2_000,
        value: U256::from(300u64),
    };
    let tx = call_tx(0, CallFunc::TimeLock, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), ALICE, &tx).expect("locked");

    let p = TimeLockParam {
        lock_type: LockType::TimeLockToTimeLock,
        asset_id: SYSTEM_ASSET_ID,
        to: CAROL,
        start_time: 1_200,
        end_time: 1_800,
        value: U256::from(100u64),
    };
    let tx = call_tx(0, CallFunc::TimeLock, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), BOB, &tx).expect("moved");

    // surplus splitting may change the interval structure, never the
    // value available at any instant
    let after: Vec<U256> = instants.iter().map(|t| total_at(&state, *t)).collect();
    assert_eq!(after, before);
}

/// A failing call leaves no state change behind, only the error log.
#[test]
fn failed_call_rolls_back() {
    let mut state = StateDB::new();
    state.add_balance(&ALICE, &SYSTEM_ASSET_ID, U256::from(10u64));

    let p = AssetValueChangeParam {
        asset_id: Hash::repeat_byte(0x70),
        to: ALICE,
        value: U256::from(5u64),
        is_inc: true,
        transac_data: String::new(),
    };
    let tx = call_tx(0, CallFunc::AssetValueChange, rlp::encode(&p).to_vec());
    let err = execute_native_call(&mut state, &env(10, 500), ALICE, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::AssetNotFound(_)));

    assert_eq!(
        state.get_balance(&SYSTEM_ASSET_ID, &ALICE),
        U256::from(10u64)
    );
    let last_log = state.logs().last().expect("error logged");
    let text = String::from_utf8(last_log.data.clone()).expect("json");
    assert!(text.contains("Error"));
}

/// Smart transfers pick the cheapest funding source and degrade to a
/// plain credit over the whole line.
#[test]
fn smart_transfer_mixes_sources() {
    let mut state = StateDB::new();
    let height = hard_fork_height(3).expect("configured") + 1;
    let ts = 500u64;

    state.add_balance(&ALICE, &SYSTEM_ASSET_ID, U256::from(70u64));
    let seed = new_time_lock(U256::from(30u64), 400, 3_000).expect("valid");
    state.add_timelock_balance(&ALICE, &SYSTEM_ASSET_ID, &seed, height, ts);

    // requirement (1_000..2_000, 100): 30 covered by the lock, 70
    // drawn from balance
    let p = TimeLockParam {
        lock_type: LockType::SmartTransfer,
        asset_id: SYSTEM_ASSET_ID,
        to: BOB,
        start_time: 1_000,
        end_time: 2_000,
        value: U256::from(100u64),
    };
    let tx = call_tx(0, CallFunc::TimeLock, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(height, ts), ALICE, &tx).expect("applied");

    assert_eq!(state.get_balance(&SYSTEM_ASSET_ID, &ALICE), U256::zero());
    assert_eq!(
        state.get_timelock_balance(&SYSTEM_ASSET_ID, &BOB),
        lock(&[(1_000, 2_000, U256::from(100u64))])
    );
    // Alice keeps the lock remainder outside the window plus the
    // balance conversion surplus
    let alice_lock = state.get_timelock_balance(&SYSTEM_ASSET_ID, &ALICE);
    assert_eq!(
        alice_lock.get_spendable_value(500, 999),
        U256::from(100u64)
    );
    assert_eq!(
        alice_lock.get_spendable_value(2_001, 3_000),
        U256::from(100u64)
    );
    assert_eq!(
        alice_lock.get_spendable_value(1_000, 2_000),
        U256::zero()
    );

    // before the fork the lock type is rejected
    let tx = call_tx(1, CallFunc::TimeLock, rlp::encode(&p).to_vec());
    let err = apply_native_call(
        &mut state,
        &env(hard_fork_height(3).expect("configured") - 1, ts),
        ALICE,
        &tx,
    )
    .unwrap_err();
    assert!(matches!(err, BlockchainError::NotEnabled(_)));
}

/// Minting and burning a changeable asset adjust supply and owner
/// balance together.
#[test]
fn asset_value_change_round() {
    let mut state = StateDB::new();
    let asset_id = register_asset(&mut state, 0x71, ALICE, 100);

    let p = AssetValueChangeParam {
        asset_id,
        to: ALICE,
        value: U256::from(50u64),
        is_inc: true,
        transac_data: String::new(),
    };
    let tx = call_tx(0, CallFunc::AssetValueChange, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), ALICE, &tx).expect("minted");
    assert_eq!(state.get_balance(&asset_id, &ALICE), U256::from(150u64));
    assert_eq!(
        state.get_asset(&asset_id).expect("found").total,
        U256::from(150u64)
    );

    // only the owner may change supply
    let tx = call_tx(0, CallFunc::AssetValueChange, rlp::encode(&p).to_vec());
    let err = apply_native_call(&mut state, &env(10, 500), BOB, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::NotAssetOwner));

    // burns only touch the owner's own account
    let p = AssetValueChangeParam {
        asset_id,
        to: BOB,
        value: U256::from(10u64),
        is_inc: false,
        transac_data: String::new(),
    };
    let tx = call_tx(1, CallFunc::AssetValueChange, rlp::encode(&p).to_vec());
    let err = apply_native_call(&mut state, &env(10, 500), ALICE, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::DecrementNotOwnAccount));
}

/// Generated assets are bound to their creating transaction and
/// credited to the issuer.
#[test]
fn gen_asset_binds_to_transaction() {
    use tempo_common::transaction::payload::GenAssetParam;

    let mut state = StateDB::new();
    let p = GenAssetParam {
        name: "Token".into(),
        symbol: "TOK".into(),
        decimals: 18,
        total: U256::from(777u64),
        can_change: false,
        description: String::new(),
    };
    let tx = call_tx(0, CallFunc::GenAsset, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(10, 500), ALICE, &tx).expect("issued");

    let asset = state.get_asset(&tx.hash()).expect("registered");
    assert_eq!(asset.owner, ALICE);
    assert_eq!(asset.total, U256::from(777u64));
    assert_eq!(state.get_balance(&tx.hash(), &ALICE), U256::from(777u64));

    // the same message cannot mint twice
    let err = apply_native_call(&mut state, &env(10, 500), ALICE, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::AssetExists(_)));
}

/// Private swaps admit only listed takers once target checking is
/// fork-enabled.
#[test]
fn private_swap_targets_enforced() {
    let mut state = StateDB::new();
    let height = hard_fork_height(2).expect("configured") + 10;
    let ts = 500u64;

    let to_asset = register_asset(&mut state, 0x80, BOB, 1_000);
    let from_asset = register_asset(&mut state, 0x81, ALICE, 1_000);
    state.add_balance(&CAROL, &to_asset, U256::from(100u64));

    let p = MakeSwapParam {
        from_asset_id: from_asset,
        from_start_time: TIMELOCK_NOW,
        from_end_time: TIMELOCK_FOREVER,
        min_from_amount: U256::one(),
        to_asset_id: to_asset,
        to_start_time: TIMELOCK_NOW,
        to_end_time: TIMELOCK_FOREVER,
        min_to_amount: U256::one(),
        swap_size: U256::from(4u64),
        targets: vec![BOB],
        time: ts,
        description: String::new(),
    };
    let make = call_tx(0, CallFunc::MakeSwap, rlp::encode(&p).to_vec());
    apply_native_call(&mut state, &env(height, ts), ALICE, &make).expect("made");

    let take = TakeSwapParam {
        swap_id: make.hash(),
        size: U256::one(),
    };
    let tx = call_tx(0, CallFunc::TakeSwap, rlp::encode(&take).to_vec());
    let err = apply_native_call(&mut state, &env(height, ts), CAROL, &tx).unwrap_err();
    assert!(matches!(err, BlockchainError::NotSwapTarget(_)));

    let tx = call_tx(1, CallFunc::TakeSwap, rlp::encode(&take).to_vec());
    apply_native_call(&mut state, &env(height, ts), BOB, &tx).expect("taken");
    let remaining: Swap = state.get_swap(&make.hash()).expect("open");
    assert_eq!(remaining.swap_size, U256::from(3u64));
}
