//! Property-based tests driving whole hands with random legal actions.
//!
//! Whatever the players do, chips are never created or destroyed, every
//! offered action is accepted, and every hand terminates.

use live_poker::{
    GameSettings, HandPhase, Table,
    entities::{Action, ActionChoice, Blinds, Chips, DisplayName},
};
use proptest::prelude::*;

/// Picks one offered action. `pick` selects the choice, `size` selects
/// where in a bet or raise range the amount lands.
fn choose(choices: &[ActionChoice], pick: u8, size: u8) -> Action {
    let choice = choices[usize::from(pick) % choices.len()];
    let sized = |min: Chips, max: Chips| match size % 3 {
        0 => min,
        1 => max,
        _ => min + (max - min) / 2,
    };
    match choice {
        ActionChoice::Fold => Action::Fold,
        ActionChoice::Check => Action::Check,
        ActionChoice::Call { .. } => Action::Call,
        ActionChoice::Bet { min, max } => Action::Bet(sized(min, max)),
        ActionChoice::Raise { min, max } => Action::Raise(sized(min, max)),
    }
}

fn seated_table(num_players: usize, buy_in: Chips, seed: u64) -> Table {
    let mut table = Table::new(GameSettings {
        max_seats: 6,
        blinds: Blinds { small: 5, big: 10 },
        buy_in,
        seed: Some(seed),
    });
    for seat in 0..num_players {
        table
            .sit(seat, DisplayName::new(&format!("p{seat}")))
            .unwrap();
    }
    table
}

fn chips_on_table(table: &Table) -> Chips {
    table.seats().iter().map(|seat| seat.stack).sum::<Chips>() + table.pot_total()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_random_hands_conserve_chips(
        num_players in 2usize..=6,
        buy_in in 20u32..=400,
        seed in any::<u64>(),
        moves in prop::collection::vec((any::<u8>(), any::<u8>()), 400),
    ) {
        let mut table = seated_table(num_players, buy_in, seed);
        let total = buy_in * num_players as Chips;
        table.start_game(0).unwrap();

        let mut moves = moves.into_iter();
        let mut hands = 0;
        while hands < 5 {
            prop_assert_eq!(chips_on_table(&table), total);
            match table.acting_seat() {
                Some(seat) => {
                    let choices = table.legal_actions(seat).unwrap();
                    prop_assert!(choices.contains(&Action::Fold));
                    let (pick, size) = moves.next().unwrap_or((0, 0));
                    let action = choose(&choices.0, pick, size);
                    prop_assert!(table.act(seat, action).is_ok(), "{action:?} rejected from {choices}");
                }
                None => {
                    prop_assert_eq!(table.phase(), HandPhase::HandComplete);
                    prop_assert_eq!(table.pot_total(), 0);
                    hands += 1;
                    table.finish_hand();
                    if !table.can_start_hand() {
                        break;
                    }
                    table.start_hand().unwrap();
                }
            }
        }
        prop_assert_eq!(chips_on_table(&table), total);
    }

    #[test]
    fn test_illegal_actions_change_nothing(
        seed in any::<u64>(),
        amount in 0u32..=1_000,
    ) {
        let mut table = seated_table(3, 200, seed);
        table.start_game(0).unwrap();
        let acting = table.acting_seat().unwrap();
        let stacks: Vec<Chips> = table.seats().iter().map(|seat| seat.stack).collect();
        let pot = table.pot_total();

        // Preflop there is always a bet to face, so a check or a bet is illegal.
        prop_assert!(table.act(acting, Action::Check).is_err());
        prop_assert!(table.act(acting, Action::Bet(amount)).is_err());
        let other = (acting + 1) % 3;
        prop_assert!(table.act(other, Action::Call).is_err());

        prop_assert_eq!(table.acting_seat(), Some(acting));
        prop_assert_eq!(table.pot_total(), pot);
        let after: Vec<Chips> = table.seats().iter().map(|seat| seat.stack).collect();
        prop_assert_eq!(after, stacks);
    }
}
