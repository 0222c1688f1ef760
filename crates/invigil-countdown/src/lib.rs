//! Cancellable round countdown for Invigil.
//!
//! A [`CountdownTimer`] counts a room's round down from its configured
//! length to zero, one tick per interval, and then reports expiry once.
//! It owns no task and no thread: the room actor polls
//! [`CountdownTimer::next_event`] as one branch of its `select!` loop, so
//! ticks, expiry and player actions are all handled by the same task in
//! whatever order they become ready.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, ready, accuse, ... */ }
//!         event = countdown.next_event() => match event {
//!             CountdownEvent::Tick { remaining } => broadcast_time_left(remaining),
//!             CountdownEvent::Expired => resolve_round(),
//!         },
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! While idle or cancelled, `next_event` pends forever, which makes it
//! safe to leave in the `select!` permanently. Because cancellation runs
//! on the owning task, nothing is "in flight" once `cancel` returns: no
//! tick and no expiry can be observed afterwards.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Length and cadence of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    /// Number of ticks (seconds with the default interval) in a round.
    pub seconds: u32,
    /// Wall time between two ticks.
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            seconds: 90,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// A countdown of `seconds` ticks at the default one-second cadence.
    pub fn with_seconds(seconds: u32) -> Self {
        Self {
            seconds,
            ..Default::default()
        }
    }

    /// Total wall time from `start` to expiry.
    pub fn total(&self) -> Duration {
        self.tick_interval * self.seconds
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a running countdown reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Progress: `remaining` ticks are left, counting this one.
    Tick { remaining: u32 },
    /// The full length elapsed without cancellation. Reported once.
    Expired,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Running {
        /// Value carried by the next `Tick`; 0 means the next event is `Expired`.
        remaining: u32,
        deadline: Instant,
    },
}

/// A per-room countdown.
///
/// Starting it schedules `Tick { remaining: seconds }` immediately, then
/// one tick per interval down to `Tick { remaining: 1 }`, then `Expired`
/// one interval after the last tick.
#[derive(Debug)]
pub struct CountdownTimer {
    config: CountdownConfig,
    state: State,
}

impl CountdownTimer {
    /// Creates an idle timer.
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    /// Starts counting down.
    ///
    /// Returns `false` and changes nothing if the timer is already
    /// running: a room has at most one live countdown.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("countdown already running, start refused");
            return false;
        }
        self.state = State::Running {
            remaining: self.config.seconds,
            deadline: Instant::now(),
        };
        debug!(
            seconds = self.config.seconds,
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "countdown started"
        );
        true
    }

    /// Stops the countdown. No tick and no expiry is reported afterwards.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn cancel(&mut self) {
        if let State::Running { remaining, .. } = self.state {
            debug!(remaining, "countdown cancelled");
            self.state = State::Idle;
        }
    }

    /// Waits for the next tick or for expiry.
    ///
    /// Pends forever while the timer is idle. Cancel-safe: the timer only
    /// advances once the sleep has completed, so dropping this future
    /// (e.g. because another `select!` branch won) loses nothing.
    pub async fn next_event(&mut self) -> CountdownEvent {
        let State::Running { remaining, deadline } = self.state else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        if remaining == 0 {
            self.state = State::Idle;
            debug!("countdown expired");
            return CountdownEvent::Expired;
        }

        self.state = State::Running {
            remaining: remaining - 1,
            deadline: deadline + self.config.tick_interval,
        };
        trace!(remaining, "countdown tick");
        CountdownEvent::Tick { remaining }
    }

    /// Whether a countdown is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Ticks not yet reported, or `None` when idle.
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            State::Running { remaining, .. } => Some(remaining),
            State::Idle => None,
        }
    }

    /// The configuration this timer was built with.
    pub fn config(&self) -> CountdownConfig {
        self.config
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(CountdownConfig::default())
    }
}
