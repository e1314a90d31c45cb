use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;

use jointer_governance::{
    ArgValue, BallotStatus, Governance, GovernanceConfig, GovernanceError, ThresholdVector,
    TokenWeights,
};
use jointer_nullables::NullTokenLedger;
use jointer_types::{Address, Amount, Timestamp, TokenClass};

const NOW: u64 = 10_000;

fn authority() -> Address {
    Address::from_label("authority")
}

fn voter(i: u8) -> Address {
    Address::from_label(&format!("voter-{i}"))
}

/// A governance with one primary-token rule at `percent`, an open ballot,
/// and the given balances for voter-0..voter-n.
fn setup(balances: &[u64], supply: u128, percent: u8) -> Governance<TokenWeights> {
    let token = Arc::new(NullTokenLedger::new());
    token.set_total_supply(supply);
    for (i, b) in balances.iter().enumerate() {
        token.set_balance(voter(i as u8), *b as u128);
    }
    let mut gov = Governance::new(
        Address::from_label("governance"),
        authority(),
        Address::from_label("ceo"),
        &GovernanceConfig::default(),
        TokenWeights::new().with_token(TokenClass::Primary, token),
    )
    .unwrap();
    gov.update_close_time(&authority(), Timestamp::new(NOW)).unwrap();
    gov.add_rule(
        &authority(),
        Address::from_label("escrow"),
        ThresholdVector::from_percentages([percent, 0, 0, 0]),
        "addGroup(uint256)",
    )
    .unwrap();
    gov.propose(voter(0), 0, vec![ArgValue::Uint(1)], Timestamp::new(NOW))
        .unwrap();
    gov
}

fn unsealed() -> Governance<TokenWeights> {
    Governance::new(
        Address::from_label("governance"),
        authority(),
        Address::from_label("ceo"),
        &GovernanceConfig::default(),
        TokenWeights::new(),
    )
    .unwrap()
}

proptest! {
    /// A vector empowering no class is never accepted.
    #[test]
    fn all_disabled_rule_rejected(target in prop::array::uniform20(0u8..)) {
        let mut gov = unsealed();
        let err = gov
            .add_rule(
                &authority(),
                Address::new(target),
                ThresholdVector::from_percentages([0; 4]),
                "addGroup(uint256)",
            )
            .unwrap_err();
        prop_assert!(matches!(err, GovernanceError::InvalidThreshold(_)));
        prop_assert!(gov.rules().is_empty());
    }

    /// Literal thresholds above 100% are rejected.
    #[test]
    fn over_hundred_rejected(p in 101u8..=255, slot in 0usize..4) {
        let mut gov = unsealed();
        let mut slots = [0u8; 4];
        slots[slot] = p;
        prop_assert!(gov
            .add_rule(&authority(), Address::ZERO, ThresholdVector::from_percentages(slots), "f()")
            .is_err());
    }

    /// Whatever the vote sequence, tallies equal the sum over each voter's
    /// last vote only.
    #[test]
    fn revotes_never_double_count(
        balances in prop::collection::vec(1u64..1_000, 1..6),
        votes in prop::collection::vec((0u8..6, any::<bool>()), 1..30),
    ) {
        // Supply large enough that nothing passes mid-sequence.
        let mut gov = setup(&balances, u64::MAX as u128, 100);
        let mut last: BTreeMap<u8, bool> = BTreeMap::new();
        for (who, support) in votes {
            let who = who % balances.len() as u8;
            gov.cast_vote(0, voter(who), support, Timestamp::new(NOW)).unwrap();
            last.insert(who, support);
        }
        let tally = |side: bool| -> u128 {
            last.iter()
                .filter(|(_, s)| **s == side)
                .map(|(w, _)| balances[*w as usize] as u128)
                .sum()
        };
        let ballot = gov.ballot(0).unwrap();
        prop_assert_eq!(ballot.approve[0], Amount::new(tally(true)));
        prop_assert_eq!(ballot.reject[0], Amount::new(tally(false)));
        prop_assert_eq!(ballot.votes.len(), last.len());
    }

    /// A single holder passes a rule exactly when balance/supply reaches it.
    #[test]
    fn pass_iff_threshold_reached(
        balance in 0u64..10_000,
        supply in 1u64..10_000,
        percent in 1u8..=100,
    ) {
        let balance = balance.min(supply);
        let mut gov = setup(&[balance], supply as u128, percent);
        let status = gov.cast_vote(0, voter(0), true, Timestamp::new(NOW)).unwrap();
        let expected = (balance as u128) * 100 >= (supply as u128) * percent as u128;
        prop_assert_eq!(matches!(status, BallotStatus::Passed { .. }), expected);
    }

    /// Blocked and excluded holders contribute nothing, whatever they hold.
    #[test]
    fn ineligible_weight_is_zero(balance in 1u64..u64::MAX, exclude in any::<bool>()) {
        let token = Arc::new(NullTokenLedger::new());
        token.set_total_supply(u128::MAX);
        token.set_balance(voter(0), balance as u128);
        let mut gov = Governance::new(
            Address::from_label("governance"),
            authority(),
            Address::from_label("ceo"),
            &GovernanceConfig::default(),
            TokenWeights::new().with_token(TokenClass::Primary, token),
        )
        .unwrap();
        if exclude {
            gov.add_excluded(&authority(), TokenClass::Primary, &[voter(0)]).unwrap();
        } else {
            gov.manage_blocked_wallet(&authority(), voter(0), true).unwrap();
        }
        prop_assert_eq!(gov.vote_weight(&voter(0), TokenClass::Primary), Amount::ZERO);
    }
}
