use std::{sync::Arc, thread};

use bsv_limits_lib::{
    consts::{GENESIS_ACTIVATION_MAINNET, GENESIS_ACTIVATION_TESTNET, ONE_MEGABYTE},
    max_sigops_for_block_size, ChainPosition, ConsensusPolicy, LimitName, LimitTable,
    LimitsError, LockTimeFlags, Network, Regime,
};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(1, 20_000)]
#[case(999_999, 20_000)]
#[case(ONE_MEGABYTE, 20_000)]
#[case(ONE_MEGABYTE + 1, 40_000)]
#[case(2 * ONE_MEGABYTE, 40_000)]
#[case(2 * ONE_MEGABYTE + 1, 60_000)]
#[case(32 * ONE_MEGABYTE, 640_000)]
fn sigops_by_block_size(#[case] block_size: u64, #[case] expected: u64) {
    assert_eq!(max_sigops_for_block_size(block_size).unwrap(), expected);
}

#[test]
fn zero_block_size() {
    assert!(matches!(
        max_sigops_for_block_size(0),
        Err(LimitsError::ZeroBlockSize)
    ));
}

#[rstest]
#[case(Network::Mainnet, GENESIS_ACTIVATION_MAINNET)]
#[case(Network::Testnet, GENESIS_ACTIVATION_TESTNET)]
#[case(Network::Stn, 100)]
#[case(Network::Regtest, 10_000)]
fn preset_activation_heights(#[case] network: Network, #[case] height: u64) {
    let policy = ConsensusPolicy::for_network(network);
    let before = ChainPosition::at_height(height - 1);
    let at = ChainPosition::at_height(height);
    assert_eq!(policy.regime_at(&before), Regime::PreGenesis);
    assert_eq!(policy.regime_at(&at), Regime::PostGenesis);
    assert_eq!(policy.value_at(LimitName::MaxOpsPerScript, &before), 500);
    assert_eq!(
        policy.value_at(LimitName::MaxOpsPerScript, &at),
        4_294_967_295
    );
}

#[test]
fn split_limits_never_tighten() {
    let table = LimitTable::default();
    for name in LimitName::ALL.into_iter().filter(LimitName::is_regime_split) {
        assert!(
            table.value_of(name, Regime::PostGenesis) > table.value_of(name, Regime::PreGenesis),
            "{name}"
        );
    }
}

#[test]
fn shared_policy_is_deterministic_across_threads() {
    let policy = Arc::new(ConsensusPolicy::for_network(Network::Mainnet));
    let heights = [0, GENESIS_ACTIVATION_MAINNET - 1, GENESIS_ACTIVATION_MAINNET, 800_000];
    let expected: Vec<_> = heights
        .iter()
        .map(|h| {
            let scoped = policy.scoped(&ChainPosition::at_height(*h));
            (
                scoped.regime(),
                scoped.max_ops_per_script(),
                scoped.max_pubkeys_per_multisig(),
                scoped.max_block_sigops(4_000_001).unwrap(),
            )
        })
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let policy = Arc::clone(&policy);
            thread::spawn(move || {
                heights
                    .iter()
                    .map(|h| {
                        let scoped = policy.scoped(&ChainPosition::at_height(*h));
                        (
                            scoped.regime(),
                            scoped.max_ops_per_script(),
                            scoped.max_pubkeys_per_multisig(),
                            scoped.max_block_sigops(4_000_001).unwrap(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

proptest! {
    #[test]
    fn sigops_monotonic(a in 1u64..=u64::MAX, b in 1u64..=u64::MAX) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            max_sigops_for_block_size(lo).unwrap() <= max_sigops_for_block_size(hi).unwrap()
        );
    }

    #[test]
    fn sigops_flat_within_megabyte(mb in 0u64..10_000, offset in 1u64..=ONE_MEGABYTE) {
        let size = mb * ONE_MEGABYTE + offset;
        prop_assert_eq!(max_sigops_for_block_size(size).unwrap(), (mb + 1) * 20_000);
    }

    #[test]
    fn regime_never_reverts(a in 0u64..2_000_000, b in 0u64..2_000_000) {
        let policy = ConsensusPolicy::for_network(Network::Mainnet);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            policy.regime_at(&ChainPosition::at_height(lo))
                <= policy.regime_at(&ChainPosition::at_height(hi))
        );
    }

    #[test]
    fn lock_time_flags_decode_independently(bits in 0u32..4) {
        let flags = LockTimeFlags::decode(bits).unwrap();
        prop_assert_eq!(flags.verify_sequence(), bits & 1 != 0);
        prop_assert_eq!(flags.use_median_time_past(), bits & 2 != 0);
    }
}
