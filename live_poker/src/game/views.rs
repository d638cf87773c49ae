//! What each connection is allowed to see.
//!
//! Views are rebuilt from the table after every change. Hole cards only
//! ever appear for the viewer's own seat, or for seats shown down at
//! showdown. Spectators get the same view with no hand of their own.

use serde::{Deserialize, Serialize};

use super::{
    entities::{ActionChoices, Card, Chips, DisplayName, SeatIndex, SeatStatus},
    state_machine::{HandPhase, Table},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat: SeatIndex,
    pub name: DisplayName,
    pub stack: Chips,
    /// Chips in front of the seat this street.
    pub committed: Chips,
    pub status: SeatStatus,
    pub connected: bool,
    pub is_button: bool,
    pub is_turn: bool,
    /// Hole cards shown at showdown. Empty otherwise.
    pub cards: Vec<Card>,
}

/// Prompt for the acting seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnView {
    pub seat: SeatIndex,
    pub actions: ActionChoices,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub phase: HandPhase,
    /// Occupied seats only.
    pub seats: Vec<SeatView>,
    /// The viewer's own hole cards.
    pub hand: Vec<Card>,
    pub pot: Chips,
    pub board: Vec<Card>,
    pub acting_seat: Option<SeatIndex>,
    pub viewer_seat: Option<SeatIndex>,
    /// Present only when the viewer is the acting seat.
    pub turn: Option<TurnView>,
}

impl TableView {
    /// Redacted view for `viewer`, `None` for spectators.
    #[must_use]
    pub fn for_viewer(table: &Table, viewer: Option<SeatIndex>) -> Self {
        let hand = table.hand();
        let acting_seat = table.acting_seat();
        let button = table.button();

        let seats = table
            .seats()
            .iter()
            .filter_map(|seat| {
                let occupant = seat.occupant.as_ref()?;
                let cards = hand
                    .filter(|hand| hand.is_revealed(seat.idx))
                    .and_then(|hand| hand.hole_cards(seat.idx))
                    .map(|cards| cards.to_vec())
                    .unwrap_or_default();
                Some(SeatView {
                    seat: seat.idx,
                    name: occupant.name.clone(),
                    stack: seat.stack,
                    committed: seat.committed,
                    status: seat.status,
                    connected: occupant.connected,
                    is_button: button == Some(seat.idx),
                    is_turn: acting_seat == Some(seat.idx),
                    cards,
                })
            })
            .collect();

        let own_cards = viewer
            .and_then(|seat| hand.and_then(|hand| hand.hole_cards(seat)))
            .map(|cards| cards.to_vec())
            .unwrap_or_default();

        let turn = viewer
            .filter(|&seat| acting_seat == Some(seat))
            .and_then(|seat| {
                table
                    .legal_actions(seat)
                    .map(|actions| TurnView { seat, actions })
            });

        Self {
            phase: table.phase(),
            seats,
            hand: own_cards,
            pot: table.pot_total(),
            board: table.board().to_vec(),
            acting_seat,
            viewer_seat: viewer,
            turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Action, Blinds},
        state_machine::GameSettings,
    };

    fn started_table(num_players: usize) -> Table {
        let mut table = Table::new(GameSettings {
            max_seats: 6,
            blinds: Blinds { small: 5, big: 10 },
            buy_in: 500,
            seed: Some(11),
        });
        for seat in 0..num_players {
            table
                .sit(seat, DisplayName::new(&format!("p{seat}")))
                .unwrap();
        }
        table.start_game(0).unwrap();
        table
    }

    #[test]
    fn test_viewer_sees_only_own_hole_cards() {
        let table = started_table(3);
        let view = TableView::for_viewer(&table, Some(1));
        let expected = table.hand().unwrap().hole_cards(1).unwrap().to_vec();
        assert_eq!(view.hand, expected);
        assert!(view.seats.iter().all(|seat| seat.cards.is_empty()));
    }

    #[test]
    fn test_spectator_sees_no_hole_cards() {
        let table = started_table(2);
        let view = TableView::for_viewer(&table, None);
        assert!(view.hand.is_empty());
        assert!(view.turn.is_none());
        assert_eq!(view.seats.len(), 2);
    }

    #[test]
    fn test_turn_only_for_acting_viewer() {
        let table = started_table(3);
        let acting = table.acting_seat().unwrap();
        let view = TableView::for_viewer(&table, Some(acting));
        let turn = view.turn.unwrap();
        assert_eq!(turn.seat, acting);
        assert!(turn.actions.contains(&Action::Fold));

        let other = (acting + 1) % 3;
        assert!(TableView::for_viewer(&table, Some(other)).turn.is_none());
    }

    #[test]
    fn test_pot_and_markers() {
        let table = started_table(3);
        let view = TableView::for_viewer(&table, None);
        assert_eq!(view.pot, 15);
        assert!(view.seats[0].is_button);
        assert!(view.seats[0].is_turn);
        assert_eq!(view.seats[2].committed, 10);
    }

    #[test]
    fn test_showdown_reveals_live_hands_only() {
        let mut table = started_table(3);
        table.act(0, Action::Fold).unwrap();
        while let Some(seat) = table.acting_seat() {
            let choices = table.legal_actions(seat).unwrap();
            let action = if choices.contains(&Action::Check) {
                Action::Check
            } else {
                Action::Call
            };
            table.act(seat, action).unwrap();
        }
        let view = TableView::for_viewer(&table, None);
        assert!(view.seats[0].cards.is_empty());
        assert_eq!(view.seats[1].cards.len(), 2);
        assert_eq!(view.seats[2].cards.len(), 2);
    }

    #[test]
    fn test_newcomer_never_sees_previous_occupants_cards() {
        let mut table = started_table(3);
        table.act(0, Action::Fold).unwrap();
        while let Some(seat) = table.acting_seat() {
            let choices = table.legal_actions(seat).unwrap();
            let action = if choices.contains(&Action::Check) {
                Action::Check
            } else {
                Action::Call
            };
            table.act(seat, action).unwrap();
        }
        assert_eq!(table.phase(), HandPhase::HandComplete);

        table.leave(0).unwrap();
        table.sit(0, DisplayName::new("newcomer")).unwrap();

        assert!(table.hand().unwrap().hole_cards(0).is_none());
        let view = TableView::for_viewer(&table, Some(0));
        assert!(view.hand.is_empty());
        assert!(view.seats[0].cards.is_empty());
        assert_eq!(view.seats[1].cards.len(), 2);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let table = started_table(2);
        let json = serde_json::to_value(TableView::for_viewer(&table, Some(0))).unwrap();
        assert!(json.get("actingSeat").is_some());
        assert!(json["seats"][0].get("isButton").is_some());
    }
}
