//! Integration tests for the table actor.
//!
//! Each test spawns a real actor and talks to it through its handle the
//! way a websocket connection does.

use live_poker::{
    HandPhase,
    messages::{BetRequest, ChatRequest, ClientMessage, JoinRequest, ServerMessage},
    table::{TableActor, TableConfig, TableHandle},
};
use std::time::Duration;
use tokio::{sync::mpsc::Receiver, time::timeout};
use uuid::Uuid;

struct Client {
    id: Uuid,
    updates: Receiver<ServerMessage>,
}

fn spawn_table(config: TableConfig) -> TableHandle {
    let (actor, handle) = TableActor::new(1, config);
    tokio::spawn(actor.run());
    handle
}

fn test_config() -> TableConfig {
    TableConfig {
        name: "test".to_string(),
        tick_ms: 10,
        hand_interval_ms: 50,
        seed: Some(7),
        ..TableConfig::default()
    }
}

async fn connect(handle: &TableHandle) -> Client {
    let id = Uuid::new_v4();
    let updates = handle.connect(id).await.unwrap();
    Client { id, updates }
}

async fn join(handle: &TableHandle, client: &Client, seat: usize, name: &str) {
    handle
        .command(
            client.id,
            ClientMessage::Join(JoinRequest {
                seat,
                display_name: name.to_string(),
            }),
        )
        .await
        .unwrap();
}

/// Receives until `pred` matches, failing the test after five seconds.
async fn recv_until(
    client: &mut Client,
    pred: impl Fn(&ServerMessage) -> bool,
) -> ServerMessage {
    timeout(Duration::from_secs(5), async {
        loop {
            let message = client.updates.recv().await.expect("table closed");
            if pred(&message) {
                return message;
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

async fn recv_error(client: &mut Client) -> String {
    match recv_until(client, |m| matches!(m, ServerMessage::Error(_))).await {
        ServerMessage::Error(report) => report.kind,
        _ => unreachable!(),
    }
}

/// Two seated players with a hand dealt. Seat 0 has the button and acts
/// first heads-up.
async fn heads_up(handle: &TableHandle) -> (Client, Client) {
    let mut ann = connect(handle).await;
    let mut bob = connect(handle).await;
    join(handle, &ann, 0, "ann").await;
    join(handle, &bob, 1, "bob").await;
    handle
        .command(ann.id, ClientMessage::StartGame)
        .await
        .unwrap();
    recv_until(&mut ann, |m| matches!(m, ServerMessage::Turn(_))).await;
    recv_until(&mut bob, |m| matches!(m, ServerMessage::Hand(cards) if cards.len() == 2)).await;
    (ann, bob)
}

#[tokio::test]
async fn test_connect_pushes_empty_table() {
    let handle = spawn_table(test_config());
    let mut client = connect(&handle).await;

    assert_eq!(client.updates.recv().await, Some(ServerMessage::Players(Vec::new())));
    assert_eq!(client.updates.recv().await, Some(ServerMessage::Hand(Vec::new())));
    assert_eq!(client.updates.recv().await, Some(ServerMessage::TablePot(0)));
    assert_eq!(client.updates.recv().await, Some(ServerMessage::TableCards(Vec::new())));
}

#[tokio::test]
async fn test_join_is_broadcast() {
    let handle = spawn_table(test_config());
    let ann = connect(&handle).await;
    let mut watcher = connect(&handle).await;
    join(&handle, &ann, 3, "ann").await;

    // Narration comes first, then the refreshed view.
    recv_until(&mut watcher, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "ann sits down in seat 3")
    })
    .await;
    let message = recv_until(&mut watcher, |m| {
        matches!(m, ServerMessage::Players(seats) if !seats.is_empty())
    })
    .await;
    let ServerMessage::Players(seats) = message else {
        unreachable!()
    };
    assert_eq!(seats[0].seat, 3);
    assert_eq!(seats[0].name.as_str(), "ann");
    assert_eq!(seats[0].stack, 200);
}

#[tokio::test]
async fn test_join_errors_go_to_sender_only() {
    let handle = spawn_table(test_config());
    let mut ann = connect(&handle).await;
    let mut mallory = connect(&handle).await;
    join(&handle, &ann, 0, "ann").await;
    join(&handle, &mallory, 0, "mallory").await;
    assert_eq!(recv_error(&mut mallory).await, "SeatUnavailable");

    join(&handle, &mallory, 1, "   ").await;
    assert_eq!(recv_error(&mut mallory).await, "MalformedAction");

    handle
        .command(ann.id, ClientMessage::Chat(ChatRequest { text: "done".into() }))
        .await
        .unwrap();
    // Ann sees her own chat line and never an error.
    let message = recv_until(&mut ann, |m| {
        matches!(m, ServerMessage::ChatMessage(_) | ServerMessage::Error(_))
    })
    .await;
    assert_eq!(message, ServerMessage::ChatMessage("ann: done".to_string()));
}

#[tokio::test]
async fn test_start_game_needs_two_players() {
    let handle = spawn_table(test_config());
    let mut ann = connect(&handle).await;
    join(&handle, &ann, 0, "ann").await;
    handle
        .command(ann.id, ClientMessage::StartGame)
        .await
        .unwrap();
    assert_eq!(recv_error(&mut ann).await, "NotEnoughPlayers");

    let mut watcher = connect(&handle).await;
    handle
        .command(watcher.id, ClientMessage::StartGame)
        .await
        .unwrap();
    assert_eq!(recv_error(&mut watcher).await, "NotSeated");
}

#[tokio::test]
async fn test_start_game_deals_private_hands() {
    let handle = spawn_table(test_config());
    let (mut ann, mut bob) = heads_up(&handle).await;

    let state = handle.state().await.unwrap();
    assert!(state.is_running);
    assert_eq!(state.phase, HandPhase::Preflop);
    assert_eq!(state.pot_size, 3);
    assert_eq!(state.players, vec!["ann".to_string(), "bob".to_string()]);

    // Each side only ever sees its own two cards.
    handle
        .command(ann.id, ClientMessage::Call)
        .await
        .unwrap();
    let ServerMessage::Hand(ann_cards) =
        recv_until(&mut ann, |m| matches!(m, ServerMessage::Hand(_))).await
    else {
        unreachable!()
    };
    let ServerMessage::Hand(bob_cards) =
        recv_until(&mut bob, |m| matches!(m, ServerMessage::Hand(_))).await
    else {
        unreachable!()
    };
    assert_eq!(ann_cards.len(), 2);
    assert_eq!(bob_cards.len(), 2);
    assert!(ann_cards.iter().all(|card| !bob_cards.contains(card)));
}

#[tokio::test]
async fn test_acting_out_of_turn() {
    let handle = spawn_table(test_config());
    let (_ann, mut bob) = heads_up(&handle).await;

    handle.command(bob.id, ClientMessage::Call).await.unwrap();
    assert_eq!(recv_error(&mut bob).await, "NotYourTurn");

    let mut watcher = connect(&handle).await;
    handle.command(watcher.id, ClientMessage::Fold).await.unwrap();
    assert_eq!(recv_error(&mut watcher).await, "NotYourTurn");
}

#[tokio::test]
async fn test_illegal_bet_is_rejected() {
    let handle = spawn_table(test_config());
    let (mut ann, _bob) = heads_up(&handle).await;

    // Facing the big blind of 2 the smallest raise is to 4.
    handle
        .command(ann.id, ClientMessage::Bet(BetRequest { amount: 3 }))
        .await
        .unwrap();
    assert_eq!(recv_error(&mut ann).await, "IllegalAction");
    handle.command(ann.id, ClientMessage::Check).await.unwrap();
    assert_eq!(recv_error(&mut ann).await, "IllegalAction");

    handle
        .command(ann.id, ClientMessage::Bet(BetRequest { amount: 6 }))
        .await
        .unwrap();
    recv_until(&mut ann, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Seat 0 raises to 6")
    })
    .await;
    assert_eq!(handle.state().await.unwrap().pot_size, 8);
}

#[tokio::test]
async fn test_fold_ends_hand_and_next_hand_is_dealt() {
    let handle = spawn_table(test_config());
    let (ann, mut bob) = heads_up(&handle).await;

    handle.command(ann.id, ClientMessage::Fold).await.unwrap();
    // Bob's uncalled half of the big blind comes back before the award.
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Uncalled 1 returned to seat 1")
    })
    .await;
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Seat 1 wins 2")
    })
    .await;
    // The button moves to seat 1 for hand two.
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Hand #2, button on seat 1")
    })
    .await;
    recv_until(&mut bob, |m| matches!(m, ServerMessage::Turn(turn) if turn.seat == 1)).await;
    assert_eq!(handle.state().await.unwrap().hands_played, 2);
}

#[tokio::test]
async fn test_timeout_folds_acting_seat() {
    let handle = spawn_table(TableConfig {
        action_timeout_ms: Some(150),
        hand_interval_ms: 60_000,
        ..test_config()
    });
    let (_ann, mut bob) = heads_up(&handle).await;

    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Seat 0 ran out of time")
    })
    .await;
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Seat 0 folds")
    })
    .await;
    assert_eq!(handle.state().await.unwrap().phase, HandPhase::HandComplete);
}

#[tokio::test]
async fn test_disconnect_keeps_seat_for_reconnect() {
    let handle = spawn_table(test_config());
    let ann = connect(&handle).await;
    join(&handle, &ann, 0, "ann").await;
    handle.disconnect(ann.id).await.unwrap();

    let mut watcher = connect(&handle).await;
    let ServerMessage::Players(seats) =
        recv_until(&mut watcher, |m| matches!(m, ServerMessage::Players(_))).await
    else {
        unreachable!()
    };
    assert_eq!(seats.len(), 1);
    assert!(!seats[0].connected);

    let mut impostor = connect(&handle).await;
    join(&handle, &impostor, 0, "eve").await;
    assert_eq!(recv_error(&mut impostor).await, "SeatUnavailable");

    let mut returning = connect(&handle).await;
    join(&handle, &returning, 0, "ann").await;
    recv_until(&mut returning, |m| {
        matches!(m, ServerMessage::Players(seats) if seats.len() == 1 && seats[0].connected)
    })
    .await;
}

#[tokio::test]
async fn test_disconnected_acting_seat_is_folded_at_once() {
    let handle = spawn_table(test_config());
    let (ann, mut bob) = heads_up(&handle).await;

    handle.disconnect(ann.id).await.unwrap();
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text == "Seat 0 folds")
    })
    .await;
}

#[tokio::test]
async fn test_leave_mid_hand_vacates_after_hand() {
    let handle = spawn_table(TableConfig {
        hand_interval_ms: 60_000,
        ..test_config()
    });
    let (_ann, mut bob) = heads_up(&handle).await;

    handle.command(bob.id, ClientMessage::Leave).await.unwrap();
    recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::GameMessage(text) if text.contains("will leave seat 1"))
    })
    .await;
    let state = handle.state().await.unwrap();
    assert_eq!(state.player_count, 2);
    assert_eq!(state.spectator_count, 1);
}

#[tokio::test]
async fn test_close_stops_actor() {
    let handle = spawn_table(test_config());
    let mut client = connect(&handle).await;
    handle.close().await.unwrap();

    // The session channel closes with the actor.
    timeout(Duration::from_secs(5), async {
        while client.updates.recv().await.is_some() {}
    })
    .await
    .unwrap();
    assert!(handle.state().await.is_err());
}
