//! Integration tests for room actors and the registry.
//!
//! The clock is paused in every test. Sleeping in the test lets Tokio
//! auto-advance time one timer at a time, so the room actor sees every
//! countdown deadline in order. Sleeps end half an interval off the
//! tick grid so which side of a tick the test lands on is unambiguous.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use invigil_countdown::CountdownConfig;
use invigil_protocol::{ConnectionId, Role, RoomCode, RoundOutcome, RoundRecord, ServerEvent};
use invigil_room::{
    GameRoom, Notifier, Phase, ResultSink, RoomConfig, RoomError, RoomHandle, RoomRegistry,
    SinkError, spawn_room,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::sleep;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(ConnectionId, ServerEvent)>>,
    rounds: Mutex<Vec<RoundRecord>>,
}

impl Recorder {
    fn to(&self, conn: ConnectionId) -> Vec<ServerEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == conn)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn role_of(&self, conn: ConnectionId) -> Role {
        self.to(conn)
            .into_iter()
            .find_map(|e| match e {
                ServerEvent::RoleReveal { role } => Some(role),
                _ => None,
            })
            .expect("no role revealed")
    }

    fn ticks(&self, conn: ConnectionId) -> Vec<u32> {
        self.to(conn)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::TimerUpdate { time_left } => Some(time_left),
                _ => None,
            })
            .collect()
    }

    fn game_overs(&self, conn: ConnectionId) -> Vec<RoundOutcome> {
        self.to(conn)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::GameOver { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    fn rounds(&self) -> Vec<RoundRecord> {
        self.rounds.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn deliver(&self, to: ConnectionId, event: ServerEvent) {
        self.events.lock().unwrap().push((to, event));
    }
}

impl ResultSink for Recorder {
    fn record(&self, record: &RoundRecord) -> Result<(), SinkError> {
        self.rounds.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NAMES: [&str; 4] = ["Asha", "Ben", "Chidi", "Dana"];

fn conn(n: u64) -> ConnectionId {
    ConnectionId::new(n)
}

fn spawn_seeded(recorder: &Arc<Recorder>, seed: u64) -> RoomHandle {
    let room = GameRoom::with_rng(
        RoomCode::new("TEST23"),
        RoomConfig::default(),
        recorder.clone(),
        recorder.clone(),
        StdRng::seed_from_u64(seed),
    );
    spawn_room(room, 16)
}

/// Seats `n` players on connections `1..=n`; the first is host.
async fn fill(handle: &RoomHandle, n: usize) {
    for (i, name) in NAMES.iter().take(n).enumerate() {
        handle.join(name, conn(i as u64 + 1)).await.unwrap();
    }
}

/// Seats three players, readies them, and starts the round.
async fn started_round(recorder: &Arc<Recorder>, seed: u64) -> RoomHandle {
    let handle = spawn_seeded(recorder, seed);
    fill(&handle, 3).await;
    for name in &NAMES[..3] {
        handle.set_ready(name).await.unwrap();
    }
    handle.start_game(conn(1)).await.unwrap();
    handle
}

fn name_with(recorder: &Recorder, role: Role) -> &'static str {
    (0..3)
        .find(|i| recorder.role_of(conn(*i as u64 + 1)) == role)
        .map(|i| NAMES[i])
        .expect("role not dealt")
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_lobby_to_round() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 1).await;

    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, Phase::InProgress);
    assert_eq!(info.player_count, 3);
    assert_eq!(info.host, Some(conn(1)));
    assert!(info.countdown_active);

    let roles: Vec<Role> = (1..=3).map(|i| recorder.role_of(conn(i))).collect();
    assert_eq!(roles.iter().filter(|r| **r == Role::Cheater).count(), 1);
    assert_eq!(roles.iter().filter(|r| **r == Role::Invigilator).count(), 1);
    assert!(recorder.to(conn(1)).contains(&ServerEvent::EnableStartButton));
}

#[tokio::test(start_paused = true)]
async fn test_start_requires_host_and_three_players() {
    let recorder = Arc::new(Recorder::default());
    let handle = spawn_seeded(&recorder, 2);
    fill(&handle, 2).await;

    let err = handle.start_game(conn(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::InsufficientPlayers { have: 2, need: 3 }));

    handle.join("Chidi", conn(3)).await.unwrap();
    let err = handle.start_game(conn(3)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotHost));

    assert_eq!(handle.info().await.unwrap().phase, Phase::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_ignored() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 3).await;
    let first = recorder.role_of(conn(2));

    handle.start_game(conn(1)).await.unwrap();
    assert_eq!(recorder.role_of(conn(2)), first);
    let reveals = recorder
        .to(conn(2))
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::RoleReveal { .. }))
        .count();
    assert_eq!(reveals, 1);
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_once_per_second() {
    let recorder = Arc::new(Recorder::default());
    let _handle = started_round(&recorder, 4).await;

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(recorder.ticks(conn(2)), (80..=90).rev().collect::<Vec<u32>>());
}

#[tokio::test(start_paused = true)]
async fn test_expiry_lets_the_cheater_escape() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 5).await;

    sleep(Duration::from_millis(90_500)).await;

    let ticks = recorder.ticks(conn(3));
    assert_eq!(ticks.len(), 90);
    assert_eq!(ticks.last(), Some(&1));
    assert_eq!(recorder.game_overs(conn(3)), vec![RoundOutcome::Escaped]);
    assert_eq!(recorder.rounds(), vec![RoundRecord::new(
        RoomCode::new("TEST23"),
        RoundOutcome::Escaped
    )]);

    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, Phase::Finished);
    assert!(!info.countdown_active);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.ticks(conn(3)).len(), 90);
    assert_eq!(recorder.game_overs(conn(3)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_round_length() {
    let recorder = Arc::new(Recorder::default());
    let config = RoomConfig {
        countdown: CountdownConfig::with_seconds(5),
        ..RoomConfig::default()
    };
    let room = GameRoom::with_rng(
        RoomCode::new("SHORT2"),
        config,
        recorder.clone(),
        recorder.clone(),
        StdRng::seed_from_u64(6),
    );
    let handle = spawn_room(room, 16);
    fill(&handle, 3).await;
    handle.start_game(conn(1)).await.unwrap();

    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(recorder.ticks(conn(1)), vec![5, 4, 3, 2, 1]);
    assert_eq!(recorder.game_overs(conn(1)), vec![RoundOutcome::Escaped]);
}

// ---------------------------------------------------------------------------
// Accusation vs. expiry
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_accusation_before_expiry_wins() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 7).await;
    let cheater = name_with(&recorder, Role::Cheater);
    let invigilator = name_with(&recorder, Role::Invigilator);

    sleep(Duration::from_millis(89_500)).await;
    let outcome = handle.accuse(invigilator, cheater).await.unwrap();
    assert_eq!(outcome, Some(RoundOutcome::Caught));

    // Past the old deadline: the cancelled countdown stays silent.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.game_overs(conn(1)), vec![RoundOutcome::Caught]);
    assert_eq!(recorder.ticks(conn(1)).len(), 90);
    assert_eq!(recorder.rounds().len(), 1);
    assert_eq!(recorder.rounds()[0].winner_role, Role::Invigilator);
}

#[tokio::test(start_paused = true)]
async fn test_accusation_after_expiry_is_ignored() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 8).await;
    let cheater = name_with(&recorder, Role::Cheater);

    sleep(Duration::from_millis(90_500)).await;
    let outcome = handle.accuse("Asha", cheater).await.unwrap();
    assert_eq!(outcome, None);

    assert_eq!(recorder.game_overs(conn(2)), vec![RoundOutcome::Escaped]);
    assert_eq!(recorder.rounds().len(), 1);
    assert_eq!(handle.info().await.unwrap().outcome, Some(RoundOutcome::Escaped));
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_accusation_and_expiry_resolve_once() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 9).await;
    let cheater = name_with(&recorder, Role::Cheater);

    sleep(Duration::from_secs(90)).await;
    let outcome = handle.accuse("Asha", cheater).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    let overs = recorder.game_overs(conn(1));
    assert_eq!(overs.len(), 1);
    assert_eq!(recorder.rounds().len(), 1);
    match outcome {
        Some(won) => assert_eq!(overs[0], won),
        None => assert_eq!(overs[0], RoundOutcome::Escaped),
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_accusations_resolve_once() {
    let recorder = Arc::new(Recorder::default());
    let handle = started_round(&recorder, 10).await;

    let mut tasks = Vec::new();
    for target in ["Asha", "Ben", "Chidi"] {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.accuse("Dana", target).await.unwrap()
        }));
    }
    let mut resolved = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            resolved += 1;
        }
    }

    assert_eq!(resolved, 1);
    assert_eq!(recorder.rounds().len(), 1);
    assert_eq!(recorder.game_overs(conn(3)).len(), 1);
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn registry(recorder: &Arc<Recorder>) -> RoomRegistry {
    RoomRegistry::new(RoomConfig::default(), recorder.clone(), recorder.clone())
}

#[tokio::test(start_paused = true)]
async fn test_create_room_mints_distinct_codes() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);

    let a = registry.create_room().await.unwrap();
    let b = registry.create_room().await.unwrap();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), RoomCode::LEN);
    assert_eq!(registry.room_count().await, 2);

    let info = registry.get_room(&a).await.unwrap().info().await.unwrap();
    assert_eq!(info.phase, Phase::Lobby);
    assert_eq!(info.player_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_is_case_insensitive() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();

    let typed = RoomCode::new(code.as_str().to_ascii_lowercase());
    assert!(registry.get_room(&typed).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_code_is_not_found() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let err = registry.get_room(&RoomCode::new("NOPE22")).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
    assert_eq!(err.code(), 404);
}

#[tokio::test(start_paused = true)]
async fn test_remove_room_is_idempotent() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    let handle = registry.get_room(&code).await.unwrap();

    assert!(registry.remove_room(&code).await);
    assert!(!registry.remove_room(&code).await);
    assert_eq!(registry.room_count().await, 0);

    let err = handle.join("Asha", conn(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn test_host_leaving_removes_the_room() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    fill(&registry.get_room(&code).await.unwrap(), 3).await;

    let departure = registry.leave(&code, "Asha").await.unwrap().unwrap();
    assert!(departure.was_host);
    assert!(recorder.to(conn(2)).contains(&ServerEvent::Message {
        msg: "The host has left. This room is closed.".into()
    }));

    let err = registry.get_room(&code).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_guest_leaving_keeps_the_room() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    let handle = registry.get_room(&code).await.unwrap();
    fill(&handle, 3).await;

    let departure = registry.leave(&code, "Ben").await.unwrap().unwrap();
    assert!(!departure.was_host);
    assert_eq!(departure.connection, conn(2));
    assert_eq!(handle.info().await.unwrap().player_count, 2);
    assert_eq!(registry.leave(&code, "Ben").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_removes_only_idle_rooms() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let idle = registry.create_room().await.unwrap();
    let busy = registry.create_room().await.unwrap();

    sleep(Duration::from_secs(20 * 60)).await;
    registry
        .get_room(&busy)
        .await
        .unwrap()
        .join("Asha", conn(1))
        .await
        .unwrap();
    sleep(Duration::from_secs(15 * 60)).await;

    let removed = registry.sweep_idle(Duration::from_secs(30 * 60)).await;
    assert_eq!(removed, vec![idle.clone()]);
    assert_eq!(registry.room_codes().await, vec![busy]);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_collects_finished_rounds() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    let handle = registry.get_room(&code).await.unwrap();
    fill(&handle, 3).await;
    handle.start_game(conn(1)).await.unwrap();

    sleep(Duration::from_secs(91)).await;
    assert_eq!(handle.info().await.unwrap().phase, Phase::Finished);
    assert!(registry.sweep_idle(Duration::from_secs(60)).await.is_empty());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(registry.sweep_idle(Duration::from_secs(60)).await, vec![code]);
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_spares_a_running_round() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    let handle = registry.get_room(&code).await.unwrap();
    fill(&handle, 3).await;
    handle.start_game(conn(1)).await.unwrap();

    sleep(Duration::from_millis(60_500)).await;
    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, Phase::InProgress);
    assert!(info.idle_for >= Duration::from_secs(60));

    assert!(registry.sweep_idle(Duration::from_secs(60)).await.is_empty());
    assert!(registry.get_room(&code).await.is_ok());

    sleep(Duration::from_secs(40)).await;
    assert_eq!(recorder.game_overs(conn(2)), vec![RoundOutcome::Escaped]);
    assert_eq!(recorder.rounds().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_tells_seated_players_the_room_closed() {
    let recorder = Arc::new(Recorder::default());
    let registry = registry(&recorder);
    let code = registry.create_room().await.unwrap();
    fill(&registry.get_room(&code).await.unwrap(), 2).await;

    sleep(Duration::from_secs(31 * 60)).await;
    assert_eq!(registry.sweep_idle(Duration::from_secs(30 * 60)).await, vec![code.clone()]);

    let closed = ServerEvent::Message {
        msg: "This room was closed for inactivity.".into(),
    };
    assert!(recorder.to(conn(1)).contains(&closed));
    assert!(recorder.to(conn(2)).contains(&closed));
    assert!(matches!(
        registry.get_room(&code).await,
        Err(RoomError::NotFound(_))
    ));
}
