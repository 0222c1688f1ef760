//! The per-room state machine.
//!
//! [`GameRoom`] is plain synchronous state: every operation validates,
//! mutates, and then hands the resulting events to the [`Notifier`].
//! It is never shared. The room actor owns it and feeds it one command
//! (or one countdown event) at a time.

use std::sync::Arc;
use std::time::Duration;

use invigil_countdown::{CountdownEvent, CountdownTimer};
use invigil_protocol::{
    ConnectionId, Recipient, Role, RoomCode, RoundOutcome, RoundRecord, ServerEvent,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{Notifier, Phase, ResultSink, RoomConfig, RoomError, assign_roles};

/// One seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub connection: ConnectionId,
    /// `None` until the round starts.
    pub role: Option<Role>,
    pub ready: bool,
}

/// Returned by [`GameRoom::leave`] when a player was actually removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub name: String,
    pub connection: ConnectionId,
    /// The departing player was the host; the room must be removed.
    pub was_host: bool,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub player_count: usize,
    pub ready_count: usize,
    pub host: Option<ConnectionId>,
    pub countdown_active: bool,
    /// Seconds left on the countdown, if it is running.
    pub time_left: Option<u32>,
    pub outcome: Option<RoundOutcome>,
    /// Time since the last accepted transition.
    pub idle_for: Duration,
}

/// A room's full game state.
pub struct GameRoom {
    code: RoomCode,
    config: RoomConfig,
    phase: Phase,
    /// Seated players in join order.
    players: Vec<Player>,
    host: Option<ConnectionId>,
    countdown: CountdownTimer,
    outcome: Option<RoundOutcome>,
    last_activity: Instant,
    rng: StdRng,
    notifier: Arc<dyn Notifier>,
    results: Arc<dyn ResultSink>,
}

impl GameRoom {
    /// Creates an empty room in [`Phase::Lobby`] with an OS-seeded role RNG.
    pub fn new(
        code: RoomCode,
        config: RoomConfig,
        notifier: Arc<dyn Notifier>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self::with_rng(code, config, notifier, results, StdRng::from_os_rng())
    }

    /// Creates an empty room that deals roles from `rng`.
    pub fn with_rng(
        code: RoomCode,
        config: RoomConfig,
        notifier: Arc<dyn Notifier>,
        results: Arc<dyn ResultSink>,
        rng: StdRng,
    ) -> Self {
        let config = config.validated();
        Self {
            code,
            config,
            phase: Phase::Lobby,
            players: Vec::with_capacity(config.max_players),
            host: None,
            countdown: CountdownTimer::new(config.countdown),
            outcome: None,
            last_activity: Instant::now(),
            rng,
            notifier,
            results,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// The connection of the first player who joined.
    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            phase: self.phase,
            player_count: self.players.len(),
            ready_count: self.ready_count(),
            host: self.host,
            countdown_active: self.countdown.is_running(),
            time_left: self.countdown.remaining(),
            outcome: self.outcome,
            idle_for: self.last_activity.elapsed(),
        }
    }

    // -- Operations -------------------------------------------------------

    /// Seats `name` on `connection`.
    ///
    /// The first successful join makes `connection` the host.
    pub fn join(&mut self, name: &str, connection: ConnectionId) -> Result<(), RoomError> {
        if !self.phase.accepts_joins() {
            return Err(RoomError::InvalidPhase {
                action: "join",
                phase: self.phase,
            });
        }
        if self.player(name).is_some() {
            return Err(RoomError::DuplicateName(name.to_string()));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        self.players.push(Player {
            name: name.to_string(),
            connection,
            role: None,
            ready: false,
        });
        let is_host = self.host.is_none();
        if is_host {
            self.host = Some(connection);
        }
        self.touch();

        info!(
            room_code = %self.code,
            player = %name,
            %connection,
            is_host,
            players = self.players.len(),
            "player joined"
        );

        let mut events = vec![
            (
                Recipient::Connection(connection),
                ServerEvent::Joined {
                    room_code: self.code.clone(),
                    username: name.to_string(),
                },
            ),
            (Recipient::Room, self.roster_event()),
            (
                Recipient::Room,
                ServerEvent::Message {
                    msg: format!("{name} has joined."),
                },
            ),
        ];
        events.extend(self.ready_events());
        self.dispatch(events);
        Ok(())
    }

    /// Marks `name` ready. Ignored outside the lobby.
    pub fn set_ready(&mut self, name: &str) -> Result<(), RoomError> {
        if self.phase != Phase::Lobby {
            debug!(room_code = %self.code, player = %name, phase = %self.phase, "ready ignored");
            return Ok(());
        }
        let player = self
            .players
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| RoomError::UnknownPlayer(name.to_string()))?;
        player.ready = true;
        self.touch();

        debug!(
            room_code = %self.code,
            player = %name,
            ready = self.ready_count(),
            total = self.players.len(),
            "player ready"
        );
        let events = self.ready_events();
        self.dispatch(events);
        Ok(())
    }

    /// Deals roles and starts the round. Only the host may start.
    ///
    /// Ignored outside the lobby.
    pub fn start_game(&mut self, requester: ConnectionId) -> Result<(), RoomError> {
        if self.phase != Phase::Lobby {
            debug!(room_code = %self.code, %requester, phase = %self.phase, "start ignored");
            return Ok(());
        }
        if self.host != Some(requester) {
            return Err(RoomError::NotHost);
        }
        let have = self.players.len();
        if have < self.config.min_players {
            return Err(RoomError::InsufficientPlayers {
                have,
                need: self.config.min_players,
            });
        }

        let names = self.roster();
        let deal = assign_roles(&names, &mut self.rng)?;
        for player in &mut self.players {
            player.role = deal.get(&player.name).copied();
        }

        let mut events: Vec<(Recipient, ServerEvent)> = self
            .players
            .iter()
            .filter_map(|p| {
                p.role
                    .map(|role| (Recipient::Connection(p.connection), ServerEvent::RoleReveal { role }))
            })
            .collect();
        events.push((
            Recipient::Room,
            ServerEvent::GameStart {
                message: "The exam has started!".to_string(),
            },
        ));
        events.extend(self.suspect_options());

        self.advance(Phase::InProgress);
        self.countdown.start();
        self.touch();

        info!(room_code = %self.code, players = have, "round started");
        self.dispatch(events);
        Ok(())
    }

    /// Resolves the round by accusing `target`.
    ///
    /// Returns the outcome, or `None` when the room is not in progress
    /// (the round was already resolved, or never started).
    pub fn accuse(
        &mut self,
        guesser: &str,
        target: &str,
    ) -> Result<Option<RoundOutcome>, RoomError> {
        if self.phase != Phase::InProgress {
            debug!(
                room_code = %self.code,
                %guesser,
                %target,
                phase = %self.phase,
                "accusation ignored"
            );
            return Ok(None);
        }
        let role = self
            .player(target)
            .and_then(|p| p.role)
            .ok_or_else(|| RoomError::UnknownTarget(target.to_string()))?;

        let (outcome, result) = if role == Role::Cheater {
            (RoundOutcome::Caught, format!("Caught! {target} was the Cheater!"))
        } else {
            (
                RoundOutcome::EscapedByError,
                format!("Wrong guess! {target} was an innocent {role}."),
            )
        };
        info!(room_code = %self.code, %guesser, %target, %role, "accusation made");
        self.finish(outcome, result);
        Ok(Some(outcome))
    }

    /// Removes `name`. Returns `None` if no such player is seated.
    pub fn leave(&mut self, name: &str) -> Option<Departure> {
        let index = self.players.iter().position(|p| p.name == name)?;
        let player = self.players.remove(index);
        let was_host = self.host == Some(player.connection);
        self.touch();

        info!(
            room_code = %self.code,
            player = %name,
            was_host,
            players = self.players.len(),
            "player left"
        );

        let mut events = vec![
            (Recipient::Room, self.roster_event()),
            (
                Recipient::Room,
                ServerEvent::Message {
                    msg: format!("{name} has left."),
                },
            ),
        ];
        if was_host {
            self.host = None;
            self.countdown.cancel();
            events.push((
                Recipient::Room,
                ServerEvent::Message {
                    msg: "The host has left. This room is closed.".to_string(),
                },
            ));
        } else if self.phase == Phase::Lobby {
            events.extend(self.ready_events());
        } else if self.phase == Phase::InProgress {
            events.extend(self.suspect_options());
        }
        self.dispatch(events);

        Some(Departure {
            name: player.name,
            connection: player.connection,
            was_host,
        })
    }

    /// Broadcasts the remaining time. Ignored unless in progress.
    pub fn on_timer_tick(&mut self, remaining: u32) {
        if self.phase != Phase::InProgress {
            return;
        }
        self.dispatch(vec![(
            Recipient::Room,
            ServerEvent::TimerUpdate {
                time_left: remaining,
            },
        )]);
    }

    /// Resolves the round in the Cheater's favour if it is still running.
    pub fn on_timer_expired(&mut self) -> Option<RoundOutcome> {
        if self.phase != Phase::InProgress {
            debug!(room_code = %self.code, phase = %self.phase, "late expiry ignored");
            return None;
        }
        self.finish(RoundOutcome::Escaped, "Time's up! The Cheater escaped.".to_string());
        Some(RoundOutcome::Escaped)
    }

    /// Routes one countdown event to the matching handler.
    pub fn on_countdown(&mut self, event: CountdownEvent) {
        match event {
            CountdownEvent::Tick { remaining } => self.on_timer_tick(remaining),
            CountdownEvent::Expired => {
                self.on_timer_expired();
            }
        }
    }

    /// Waits for the room's next countdown event.
    ///
    /// Pends forever while no countdown is running. Cancel-safe.
    pub async fn next_countdown_event(&mut self) -> CountdownEvent {
        self.countdown.next_event().await
    }

    /// Stops the countdown. Called when the room is torn down.
    pub fn close(&mut self) {
        self.countdown.cancel();
    }

    /// True when no round is counting down and nothing has been accepted
    /// for at least `max_idle`.
    pub fn is_idle(&self, max_idle: Duration) -> bool {
        !self.countdown.is_running() && self.last_activity.elapsed() >= max_idle
    }

    /// Tells anyone still seated that the room is going away.
    pub fn close_idle(&mut self) {
        info!(room_code = %self.code, players = self.players.len(), "closing idle room");
        self.dispatch(vec![(
            Recipient::Room,
            ServerEvent::Message {
                msg: "This room was closed for inactivity.".to_string(),
            },
        )]);
        self.close();
    }

    // -- Internals --------------------------------------------------------

    fn finish(&mut self, outcome: RoundOutcome, result: String) {
        self.advance(Phase::Finished);
        self.countdown.cancel();
        self.outcome = Some(outcome);
        self.touch();

        let winner = outcome.winner();
        info!(room_code = %self.code, %outcome, %winner, "round finished");
        self.dispatch(vec![(
            Recipient::Room,
            ServerEvent::GameOver {
                result,
                outcome,
                winner,
            },
        )]);

        let record = RoundRecord::new(self.code.clone(), outcome);
        if let Err(e) = self.results.record(&record) {
            warn!(room_code = %self.code, error = %e, "failed to persist round result");
        }
    }

    fn advance(&mut self, target: Phase) {
        debug_assert!(
            self.phase.can_transition_to(target),
            "illegal phase transition {} -> {}",
            self.phase,
            target
        );
        debug!(room_code = %self.code, from = %self.phase, to = %target, "phase change");
        self.phase = target;
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.ready).count()
    }

    fn roster(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    fn roster_event(&self) -> ServerEvent {
        ServerEvent::UpdatePlayers {
            players: self.roster(),
        }
    }

    /// `ready_status` for everyone, plus `enable_start_button` for the
    /// host once enough players are all ready.
    fn ready_events(&self) -> Vec<(Recipient, ServerEvent)> {
        let ready = self.ready_count();
        let total = self.players.len();
        let mut events = vec![(Recipient::Room, ServerEvent::ReadyStatus { ready, total })];
        if total >= self.config.min_players && ready == total {
            if let Some(host) = self.host {
                events.push((Recipient::Connection(host), ServerEvent::EnableStartButton));
            }
        }
        events
    }

    /// The accusation targets, sent privately to the Invigilator. `None`
    /// when nobody holds that role.
    fn suspect_options(&self) -> Option<(Recipient, ServerEvent)> {
        let invigilator = self.players.iter().find(|p| p.role == Some(Role::Invigilator))?;
        let suspects = self
            .players
            .iter()
            .filter(|p| p.name != invigilator.name)
            .map(|p| p.name.clone())
            .collect();
        Some((
            Recipient::Connection(invigilator.connection),
            ServerEvent::UpdatePlayerOptions { players: suspects },
        ))
    }

        /// Hands events to the notifier. Room-wide events go to the players
    /// seated at the time of dispatch.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        if events.is_empty() {
            return;
        }
        let members: Vec<ConnectionId> = self.players.iter().map(|p| p.connection).collect();
        for (recipient, event) in events {
            match recipient {
                Recipient::Room => self.notifier.deliver_to_room(&self.code, &members, event),
                Recipient::Connection(conn) => self.notifier.deliver(conn, event),
            }
        }
    }
}
