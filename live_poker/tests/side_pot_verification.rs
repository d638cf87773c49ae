//! Side pot calculation tests.
//!
//! These tests verify that pots are layered and awarded correctly:
//! - Multiple all-ins at different amounts
//! - Folded seats contribute but can't win
//! - Odd chips go to the tied seat nearest the button
//! - No chip is lost for any mix of contributions

use live_poker::game::{
    entities::{Chips, HandRank, Rank, SeatIndex},
    pot::{award_pots, compute_pots},
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn rank(rank: Rank, high: u8) -> HandRank {
    HandRank {
        rank,
        values: [high, 0, 0, 0, 0],
    }
}

#[test]
fn test_multiple_side_pots_four_players() {
    // Seat 0: all-in 25, seat 1: all-in 75, seats 2 and 3: 150 each.
    let contributions = BTreeMap::from([(0, 25), (1, 75), (2, 150), (3, 150)]);
    let live = BTreeSet::from([0, 1, 2, 3]);
    let pots = compute_pots(&contributions, &live);

    let amounts: Vec<Chips> = pots.iter().map(|pot| pot.amount).collect();
    assert_eq!(amounts, vec![100, 150, 150]);
    assert_eq!(pots[0].eligible, vec![0, 1, 2, 3]);
    assert_eq!(pots[1].eligible, vec![1, 2, 3]);
    assert_eq!(pots[2].eligible, vec![2, 3]);
}

#[test]
fn test_short_stack_wins_main_pot_only() {
    let contributions = BTreeMap::from([(0, 50), (1, 100), (2, 100)]);
    let live = BTreeSet::from([0, 1, 2]);
    let pots = compute_pots(&contributions, &live);
    let ranks = BTreeMap::from([
        (0, rank(Rank::FourOfAKind, 9)),
        (1, rank(Rank::Flush, 13)),
        (2, rank(Rank::OnePair, 4)),
    ]);

    let winnings = award_pots(&pots, &ranks, 0, 3);
    assert_eq!(winnings.get(&0), Some(&150));
    assert_eq!(winnings.get(&1), Some(&100));
    assert_eq!(winnings.get(&2), None);
}

#[test]
fn test_folded_seat_pays_but_cannot_win() {
    let contributions = BTreeMap::from([(0, 50), (1, 100), (2, 100)]);
    let live = BTreeSet::from([1, 2]);
    let pots = compute_pots(&contributions, &live);

    assert_eq!(pots.len(), 1);
    assert_eq!(pots[0].amount, 250);
    assert_eq!(pots[0].eligible, vec![1, 2]);
}

#[test]
fn test_odd_chip_goes_left_of_button() {
    let contributions = BTreeMap::from([(0, 5), (1, 5), (2, 5)]);
    let live = BTreeSet::from([0, 1, 2]);
    let pots = compute_pots(&contributions, &live);
    let tied = rank(Rank::Straight, 9);
    let ranks = BTreeMap::from([(0, tied), (2, tied), (1, rank(Rank::HighCard, 7))]);

    // Button on seat 1: seat 2 is first clockwise.
    let winnings = award_pots(&pots, &ranks, 1, 3);
    assert_eq!(winnings.get(&2), Some(&8));
    assert_eq!(winnings.get(&0), Some(&7));

    // Button on seat 2: seat 0 is first clockwise.
    let winnings = award_pots(&pots, &ranks, 2, 3);
    assert_eq!(winnings.get(&0), Some(&8));
    assert_eq!(winnings.get(&2), Some(&7));
}

fn contributions_strategy() -> impl Strategy<Value = (BTreeMap<SeatIndex, Chips>, BTreeSet<SeatIndex>)> {
    prop::collection::vec((1u32..=500, any::<bool>()), 2..=10).prop_map(|seats| {
        let contributions: BTreeMap<SeatIndex, Chips> = seats
            .iter()
            .enumerate()
            .map(|(seat, (amount, _))| (seat, *amount))
            .collect();
        let mut live: BTreeSet<SeatIndex> = seats
            .iter()
            .enumerate()
            .filter(|(_, (_, live))| *live)
            .map(|(seat, _)| seat)
            .collect();
        // A hand always has a live seat at the end.
        if live.is_empty() {
            live.insert(0);
        }
        (contributions, live)
    })
}

proptest! {
    #[test]
    fn test_pots_hold_every_chip((contributions, live) in contributions_strategy()) {
        let pots = compute_pots(&contributions, &live);
        let total: Chips = contributions.values().sum();
        prop_assert_eq!(pots.iter().map(|pot| pot.amount).sum::<Chips>(), total);
        for pot in &pots {
            prop_assert!(!pot.eligible.is_empty());
            prop_assert!(pot.eligible.iter().all(|seat| live.contains(seat)));
        }
    }

    #[test]
    fn test_awards_hand_out_every_chip(
        (contributions, live) in contributions_strategy(),
        strengths in prop::collection::vec(0u8..4, 10),
        button in 0usize..10,
    ) {
        let pots = compute_pots(&contributions, &live);
        let ranks: BTreeMap<SeatIndex, HandRank> = live
            .iter()
            .map(|&seat| (seat, rank(Rank::OnePair, strengths[seat] + 2)))
            .collect();
        let winnings = award_pots(&pots, &ranks, button, 10);
        let total: Chips = contributions.values().sum();
        prop_assert_eq!(winnings.values().sum::<Chips>(), total);
        prop_assert!(winnings.keys().all(|seat| live.contains(seat)));
    }
}
