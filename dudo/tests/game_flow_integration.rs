//! Integration tests for session flow scenarios.
//!
//! These drive full sessions through the playground and actor handles
//! with channel-backed connections, the same way the server's
//! WebSocket layer does.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use dudo::{
    AccusationKind, ClientEvent, GameHandle, GameProgression, GameRules, Playground, ServerEvent,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

async fn recv_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("connection channel closed")
}

/// Drains events until `pred` yields a value, failing on timeout.
async fn wait_for<F, T>(rx: &mut mpsc::Receiver<ServerEvent>, mut pred: F) -> T
where
    F: FnMut(ServerEvent) -> Option<T>,
{
    loop {
        let event = recv_event(rx).await;
        if let Some(out) = pred(event) {
            return out;
        }
    }
}

async fn wait_for_ack(rx: &mut mpsc::Receiver<ServerEvent>) -> (bool, Option<String>) {
    wait_for(rx, |event| match event {
        ServerEvent::ReadyConfirm { success, error } => Some((success, error)),
        _ => None,
    })
    .await
}

/// Scans past broadcasts and earlier success acks to the next
/// rejection.
async fn wait_for_nack(rx: &mut mpsc::Receiver<ServerEvent>) -> Option<String> {
    wait_for(rx, |event| match event {
        ServerEvent::ReadyConfirm {
            success: false,
            error,
        } => Some(error),
        _ => None,
    })
    .await
}

async fn join(handle: &GameHandle, name: &str) -> (Uuid, mpsc::Receiver<ServerEvent>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(64);
    handle
        .connect(id, name.to_string(), tx)
        .await
        .expect("game closed")
        .expect("join rejected");
    (id, rx)
}

fn standard_accusation(accused: Uuid, value: u8, count: usize) -> ClientEvent {
    ClientEvent::Accusation {
        kind: AccusationKind::Standard,
        accused_player: accused,
        dice_value: Some(value),
        dice_count: Some(count),
    }
}

/// An accusation that can never hold: more dice than are in play.
/// Resolving it always costs the accuser a die, which makes round
/// outcomes deterministic despite hidden rolls.
fn impossible_accusation(accused: Uuid) -> ClientEvent {
    standard_accusation(accused, 3, 11)
}

async fn start_two_player_game(
    playground: &Playground,
) -> (
    GameHandle,
    (Uuid, mpsc::Receiver<ServerEvent>),
    (Uuid, mpsc::Receiver<ServerEvent>),
) {
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, mut rx1) = join(&handle, "alice").await;
    let (p2, mut rx2) = join(&handle, "bob").await;

    handle.event(p1, ClientEvent::PlayerReady).await.unwrap();
    handle.event(p2, ClientEvent::PlayerReady).await.unwrap();

    wait_for(&mut rx1, |event| match event {
        ServerEvent::GameStart { .. } => Some(()),
        _ => None,
    })
    .await;
    wait_for(&mut rx2, |event| match event {
        ServerEvent::GameStart { .. } => Some(()),
        _ => None,
    })
    .await;

    (handle, (p1, rx1), (p2, rx2))
}

#[tokio::test]
async fn test_two_players_ready_starts_game() {
    let playground = Playground::new();
    let (handle, (p1, mut rx1), (p2, _rx2)) = start_two_player_game(&playground).await;

    // The ring contains exactly the two players: each is the other's
    // neighbor on both sides.
    let (left, right) = wait_for(&mut rx1, |event| match event {
        ServerEvent::PlayerReady {
            left_player_id,
            right_player_id,
            ..
        } => Some((left_player_id, right_player_id)),
        _ => None,
    })
    .await;
    assert_eq!(left, Some(p2));
    assert_eq!(right, Some(p2));

    // Each player holds the initial 5 dice and sees only counts for
    // the others.
    let (dice, players) = wait_for(&mut rx1, |event| match event {
        ServerEvent::RoundStart { dice, players } => Some((dice, players)),
        _ => None,
    })
    .await;
    assert_eq!(dice.len(), 5);
    assert!(dice.iter().all(|&d| (1..=6).contains(&d)));
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p.current_dice_count == 5));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.progression, GameProgression::InGame);
    assert!(handle.is_seated(p1).await.unwrap());
    assert!(!handle.is_seated(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_ready_is_idempotent_in_lobby() {
    let playground = Playground::new();
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, mut rx1) = join(&handle, "alice").await;
    handle.event(p1, ClientEvent::PlayerReady).await.unwrap();
    handle.event(p1, ClientEvent::PlayerReady).await.unwrap();

    let (success, _) = wait_for_ack(&mut rx1).await;
    assert!(success);
    let (success, _) = wait_for_ack(&mut rx1).await;
    assert!(success);

    // One ready player is not enough to start.
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.progression, GameProgression::Lobby);
}

#[tokio::test]
async fn test_out_of_turn_accusation_rejected() {
    let playground = Playground::new();
    let (handle, (p1, _rx1), (p2, mut rx2)) = start_two_player_game(&playground).await;

    // The first joiner opens; p2 is out of turn.
    handle.event(p2, impossible_accusation(p1)).await.unwrap();
    let error = wait_for_nack(&mut rx2).await;
    assert_eq!(error.as_deref(), Some("not your turn"));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 2);
}

#[tokio::test]
async fn test_wrong_accusation_costs_accuser_a_die() {
    let playground = Playground::new();
    let (handle, (p1, mut rx1), (p2, _rx2)) = start_two_player_game(&playground).await;

    handle.event(p1, impossible_accusation(p2)).await.unwrap();

    let end = wait_for(&mut rx1, |event| match event {
        ServerEvent::RoundEnd {
            winner,
            loser,
            correct_accusation,
            dice_value,
            dice_count,
            players,
            ..
        } => Some((winner, loser, correct_accusation, dice_value, dice_count, players)),
        _ => None,
    })
    .await;
    let (winner, loser, correct, dice_value, dice_count, players) = end;
    assert_eq!(winner, p2);
    assert_eq!(loser, p1);
    assert!(!correct);
    assert_eq!(dice_value, Some(3));
    assert_eq!(dice_count, Some(11));
    // Round end reveals every hand that was in play.
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p.dice.len() == 5));

    // Next round: the loser rerolls one die short and keeps the turn.
    let (dice, players) = wait_for(&mut rx1, |event| match event {
        ServerEvent::RoundStart { dice, players } => Some((dice, players)),
        _ => None,
    })
    .await;
    assert_eq!(dice.len(), 4);
    let p1_count = players.iter().find(|p| p.id == p1).unwrap();
    let p2_count = players.iter().find(|p| p.id == p2).unwrap();
    assert_eq!(p1_count.current_dice_count, 4);
    assert_eq!(p2_count.current_dice_count, 5);

    // The prior loser is the next accuser: a second accusation from p1
    // is accepted (another round resolves).
    handle.event(p1, impossible_accusation(p2)).await.unwrap();
    let loser = wait_for(&mut rx1, |event| match event {
        ServerEvent::RoundEnd { loser, .. } => Some(loser),
        _ => None,
    })
    .await;
    assert_eq!(loser, p1);
}

#[tokio::test]
async fn test_elimination_finishes_game() {
    let playground = Playground::new();
    let (handle, (p1, mut rx1), (p2, mut rx2)) = start_two_player_game(&playground).await;

    // p1 keeps accusing impossibly and keeps losing; after 5 lost
    // rounds it is out of dice.
    for _ in 0..5 {
        handle.event(p1, impossible_accusation(p2)).await.unwrap();
        wait_for(&mut rx1, |event| match event {
            ServerEvent::RoundEnd { .. } => Some(()),
            _ => None,
        })
        .await;
    }

    let winner = wait_for(&mut rx2, |event| match event {
        ServerEvent::GameEnd { winner } => Some(winner),
        _ => None,
    })
    .await;
    assert_eq!(winner, p2);

    // Terminal: no further accusations are accepted.
    handle.event(p2, impossible_accusation(p1)).await.unwrap();
    let error = wait_for_nack(&mut rx2).await;
    assert_eq!(error.as_deref(), Some("game has finished"));
}

#[tokio::test]
async fn test_join_after_start_rejected() {
    let playground = Playground::new();
    let (handle, _p1, _p2) = start_two_player_game(&playground).await;

    let late = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(64);
    let result = handle.connect(late, "carol".to_string(), tx).await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_leave_in_lobby_removes_player() {
    let playground = Playground::new();
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, _rx1) = join(&handle, "alice").await;
    let (p2, _rx2) = join(&handle, "bob").await;

    handle.event(p2, ClientEvent::PlayerLeave).await.unwrap();
    handle.event(p1, ClientEvent::PlayerReady).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.progression, GameProgression::Lobby);
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].id, p1);
    assert!(!handle.is_seated(p2).await.unwrap());
}

#[tokio::test]
async fn test_disconnect_in_lobby_removes_player() {
    let playground = Playground::new();
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, _rx1) = join(&handle, "alice").await;
    let (p2, _rx2) = join(&handle, "bob").await;

    handle.disconnect(p2).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].id, p1);
}

#[tokio::test]
async fn test_leave_midgame_forfeits() {
    let playground = Playground::new();
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, mut rx1) = join(&handle, "alice").await;
    let (p2, _rx2) = join(&handle, "bob").await;
    let (p3, _rx3) = join(&handle, "carol").await;

    for id in [p1, p2, p3] {
        handle.event(id, ClientEvent::PlayerReady).await.unwrap();
    }
    wait_for(&mut rx1, |event| match event {
        ServerEvent::GameStart { .. } => Some(()),
        _ => None,
    })
    .await;

    handle.event(p3, ClientEvent::PlayerLeave).await.unwrap();
    assert!(!handle.is_seated(p3).await.unwrap());

    // The round continues for the two remaining players; the reveal
    // covers only hands still in play.
    handle.event(p1, impossible_accusation(p2)).await.unwrap();
    let players = wait_for(&mut rx1, |event| match event {
        ServerEvent::RoundEnd { players, .. } => Some(players),
        _ => None,
    })
    .await;
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p.id != p3));
}

#[tokio::test]
async fn test_disconnect_midgame_finishes_two_player_game() {
    let playground = Playground::new();
    let (handle, (p1, _rx1), (p2, mut rx2)) = start_two_player_game(&playground).await;

    handle.disconnect(p1).await.unwrap();

    let winner = wait_for(&mut rx2, |event| match event {
        ServerEvent::GameEnd { winner } => Some(winner),
        _ => None,
    })
    .await;
    assert_eq!(winner, p2);
}

#[tokio::test]
async fn test_disabled_accusation_kinds_rejected() {
    let playground = Playground::new();
    let rules = GameRules {
        paso_allowed: false,
        exact_allowed: false,
        ..GameRules::default()
    };
    let code = playground.create_game(rules);
    let handle = playground.get_game(&code).unwrap();

    let (p1, mut rx1) = join(&handle, "alice").await;
    let (p2, _rx2) = join(&handle, "bob").await;
    handle.event(p1, ClientEvent::PlayerReady).await.unwrap();
    handle.event(p2, ClientEvent::PlayerReady).await.unwrap();
    wait_for(&mut rx1, |event| match event {
        ServerEvent::GameStart { .. } => Some(()),
        _ => None,
    })
    .await;

    handle
        .event(
            p1,
            ClientEvent::Accusation {
                kind: AccusationKind::Paso,
                accused_player: p2,
                dice_value: None,
                dice_count: None,
            },
        )
        .await
        .unwrap();
    let error = wait_for_nack(&mut rx1).await;
    assert_eq!(error.as_deref(), Some("paso accusations are disabled"));

    handle
        .event(
            p1,
            ClientEvent::Accusation {
                kind: AccusationKind::Exact,
                accused_player: p2,
                dice_value: Some(2),
                dice_count: Some(1),
            },
        )
        .await
        .unwrap();
    let error = wait_for_nack(&mut rx1).await;
    assert_eq!(error.as_deref(), Some("exact accusations are disabled"));
}

#[tokio::test]
async fn test_accusation_in_lobby_rejected() {
    let playground = Playground::new();
    let code = playground.create_game(GameRules::default());
    let handle = playground.get_game(&code).unwrap();

    let (p1, mut rx1) = join(&handle, "alice").await;
    let (p2, _rx2) = join(&handle, "bob").await;

    handle.event(p1, impossible_accusation(p2)).await.unwrap();
    let error = wait_for_nack(&mut rx1).await;
    assert_eq!(error.as_deref(), Some("game has not started"));
}

#[tokio::test]
async fn test_missing_claim_rejected() {
    let playground = Playground::new();
    let (handle, (p1, mut rx1), (p2, _rx2)) = start_two_player_game(&playground).await;

    handle
        .event(
            p1,
            ClientEvent::Accusation {
                kind: AccusationKind::Standard,
                accused_player: p2,
                dice_value: None,
                dice_count: None,
            },
        )
        .await
        .unwrap();
    let error = wait_for_nack(&mut rx1).await;
    assert_eq!(
        error.as_deref(),
        Some("accusation needs a dice value and count")
    );
}
