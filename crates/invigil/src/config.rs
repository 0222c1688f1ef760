//! Server configuration.
//!
//! Every setting has a default and can be overridden from the
//! environment:
//!
//! ```text
//! INVIGIL_BIND         default 127.0.0.1:8080
//! INVIGIL_RESULTS      path of the JSON-lines round log (unset: log only)
//! INVIGIL_ROUND_SECS   default 90
//! INVIGIL_SWEEP_SECS   default 60, how often idle rooms are collected
//! INVIGIL_IDLE_SECS    default 1800, how long a room may sit unused
//! ```

use std::path::PathBuf;
use std::time::Duration;

use invigil_countdown::CountdownConfig;
use invigil_room::RoomConfig;

use crate::InvigilError;

/// Settings for one server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Where finished rounds are appended. `None` logs them instead.
    pub results_path: Option<PathBuf>,
    pub room: RoomConfig,
    /// How often the idle-room sweep runs.
    pub sweep_interval: Duration,
    /// Rooms with no accepted transition for this long are removed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            results_path: None,
            room: RoomConfig::default(),
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, InvigilError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, InvigilError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("INVIGIL_BIND") {
            config.bind_addr = bind;
        }
        if let Some(path) = lookup("INVIGIL_RESULTS").filter(|p| !p.trim().is_empty()) {
            config.results_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = parse_secs(&lookup, "INVIGIL_ROUND_SECS")? {
            let seconds = u32::try_from(secs)
                .map_err(|_| InvigilError::Config(format!("INVIGIL_ROUND_SECS out of range: {secs}")))?;
            config.room.countdown = CountdownConfig::with_seconds(seconds);
        }
        if let Some(secs) = parse_secs(&lookup, "INVIGIL_SWEEP_SECS")? {
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parse_secs(&lookup, "INVIGIL_IDLE_SECS")? {
            config.idle_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, InvigilError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| InvigilError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}
