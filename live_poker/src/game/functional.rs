//! Pure hand evaluation.
//!
//! Every 5-card subset of the given cards is scored and the best score
//! wins. With at most 7 cards that's 21 subsets, which is cheap enough to
//! keep the evaluator simple and obviously correct.

use std::collections::HashSet;
use thiserror::Error;

use super::entities::{ACE, Card, HandRank, Rank, Value};

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum EvalError {
    #[error("need 5 to 7 cards, got {0}")]
    InvalidCardCount(usize),
    #[error("duplicate card {0}")]
    DuplicateCard(Card),
}

/// Best 5-card hand among 5 to 7 distinct cards. The result doesn't
/// depend on the order of `cards`.
pub fn evaluate(cards: &[Card]) -> Result<HandRank, EvalError> {
    let num_cards = cards.len();
    if !(5..=7).contains(&num_cards) {
        return Err(EvalError::InvalidCardCount(num_cards));
    }
    let mut seen = HashSet::with_capacity(num_cards);
    for card in cards {
        if !seen.insert(card) {
            return Err(EvalError::DuplicateCard(*card));
        }
    }

    let mut best: Option<HandRank> = None;
    for a in 0..num_cards {
        for b in (a + 1)..num_cards {
            for c in (b + 1)..num_cards {
                for d in (c + 1)..num_cards {
                    for e in (d + 1)..num_cards {
                        let hand = eval5(&[cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.is_none_or(|best| hand > best) {
                            best = Some(hand);
                        }
                    }
                }
            }
        }
    }
    best.ok_or(EvalError::InvalidCardCount(num_cards))
}

/// Score exactly five cards.
#[must_use]
pub fn eval5(cards: &[Card; 5]) -> HandRank {
    let mut values: [Value; 5] = cards.map(|card| card.0);
    values.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|card| card.1 == cards[0].1);
    let straight_high = straight_high(&values);

    // (count, value) pairs, most frequent first, then highest value.
    let mut groups: Vec<(u8, Value)> = Vec::with_capacity(5);
    for value in values {
        match groups.iter_mut().find(|(_, v)| *v == value) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, value)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|(_, value)| *value).collect();

    let (rank, tiebreak) = match (straight_high, is_flush, groups[0].0, groups.get(1)) {
        (Some(high), true, _, _) => (Rank::StraightFlush, vec![high]),
        (_, _, 4, _) => (Rank::FourOfAKind, grouped),
        (_, _, 3, Some((2, _))) => (Rank::FullHouse, grouped),
        (_, true, _, _) => (Rank::Flush, values.to_vec()),
        (Some(high), false, _, _) => (Rank::Straight, vec![high]),
        (_, _, 3, _) => (Rank::ThreeOfAKind, grouped),
        (_, _, 2, Some((2, _))) => (Rank::TwoPair, grouped),
        (_, _, 2, _) => (Rank::OnePair, grouped),
        _ => (Rank::HighCard, values.to_vec()),
    };

    let mut padded = [0; 5];
    for (slot, value) in padded.iter_mut().zip(tiebreak) {
        *slot = value;
    }
    HandRank {
        rank,
        values: padded,
    }
}

/// High card of a straight given values sorted descending. The wheel
/// (A-5-4-3-2) plays as a five-high straight.
fn straight_high(values: &[Value; 5]) -> Option<Value> {
    let distinct = values.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if values[0] - values[4] == 4 {
        Some(values[0])
    } else if *values == [ACE, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    }
}

/// Indices of every maximal element, ascending.
#[must_use]
pub fn argmax<T: Ord>(items: &[T]) -> Vec<usize> {
    let Some(max) = items.iter().max() else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| *item == max)
        .map(|(idx, _)| idx)
        .collect()
}
