//! Main and side pots.
//!
//! Pots are rebuilt from what each seat put in over the whole hand rather
//! than maintained incrementally. Each distinct contribution level cuts a
//! layer; a layer is contested by the live seats that reached it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::entities::{Chips, HandRank, SeatIndex};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: Vec<SeatIndex>,
}

/// Splits hand contributions into a main pot and side pots, main pot
/// first. Folded seats pay into every layer they reached but are never
/// eligible. Adjacent layers with the same eligible seats are merged, and
/// a layer nobody live reached is folded into the pot below it.
#[must_use]
pub fn compute_pots(
    contributions: &BTreeMap<SeatIndex, Chips>,
    live: &BTreeSet<SeatIndex>,
) -> Vec<Pot> {
    let levels: BTreeSet<Chips> = contributions
        .values()
        .copied()
        .filter(|&amount| amount > 0)
        .collect();

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut orphaned: Chips = 0;
    let mut floor: Chips = 0;
    for level in levels {
        let layer = level - floor;
        let mut amount: Chips = 0;
        let mut eligible = Vec::new();
        for (&seat, &contribution) in contributions {
            if contribution > floor {
                amount += layer.min(contribution - floor);
            }
            if contribution >= level && live.contains(&seat) {
                eligible.push(seat);
            }
        }
        floor = level;

        if eligible.is_empty() {
            match pots.last_mut() {
                Some(pot) => pot.amount += amount,
                None => orphaned += amount,
            }
            continue;
        }
        match pots.last_mut() {
            Some(pot) if pot.eligible == eligible => pot.amount += amount,
            _ => pots.push(Pot {
                amount: amount + std::mem::take(&mut orphaned),
                eligible,
            }),
        }
    }
    if let Some(pot) = pots.last_mut() {
        pot.amount += orphaned;
    }
    pots
}

/// Order in which tied seats receive odd chips: clockwise starting with the
/// seat left of the button.
fn distance_from_button(seat: SeatIndex, button: SeatIndex, num_seats: usize) -> usize {
    (seat + num_seats - button - 1) % num_seats
}

/// Awards every pot to the best ranked eligible seats. Ties split evenly;
/// odd chips go one at a time to the tied seats nearest clockwise from the
/// button. Seats without a rank can't win.
#[must_use]
pub fn award_pots(
    pots: &[Pot],
    ranks: &BTreeMap<SeatIndex, HandRank>,
    button: SeatIndex,
    num_seats: usize,
) -> BTreeMap<SeatIndex, Chips> {
    let mut winnings: BTreeMap<SeatIndex, Chips> = BTreeMap::new();
    for pot in pots {
        let contenders: Vec<(SeatIndex, HandRank)> = pot
            .eligible
            .iter()
            .filter_map(|seat| ranks.get(seat).map(|rank| (*seat, *rank)))
            .collect();
        let Some(best) = contenders.iter().map(|(_, rank)| *rank).max() else {
            continue;
        };
        let mut winners: Vec<SeatIndex> = contenders
            .into_iter()
            .filter(|(_, rank)| *rank == best)
            .map(|(seat, _)| seat)
            .collect();
        winners.sort_by_key(|&seat| distance_from_button(seat, button, num_seats));

        let num_winners = winners.len() as Chips;
        let share = pot.amount / num_winners;
        let remainder = (pot.amount % num_winners) as usize;
        for (i, seat) in winners.into_iter().enumerate() {
            let odd_chip = Chips::from(i < remainder);
            *winnings.entry(seat).or_default() += share + odd_chip;
        }
    }
    winnings
}
