//! Scrape tunables, read once from the environment at startup.

use std::env;
use std::time::Duration;

const AGENT_TIMEOUT_VAR: &str = "VIRTSTAT_AGENT_TIMEOUT_SECS";
const MACHINE_DEADLINE_VAR: &str = "VIRTSTAT_MACHINE_DEADLINE_SECS";

const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_MACHINE_DEADLINE: Duration = Duration::from_secs(30);

/// Timeouts governing one scrape pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Per-command guest agent timeout.
    pub agent_timeout: Duration,
    /// Budget for all collectors of a single machine.
    pub machine_deadline: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
            machine_deadline: DEFAULT_MACHINE_DEADLINE,
        }
    }
}

impl ScrapeConfig {
    /// Reads `VIRTSTAT_AGENT_TIMEOUT_SECS` and
    /// `VIRTSTAT_MACHINE_DEADLINE_SECS`, falling back to the defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        Self {
            agent_timeout: seconds_from_env(AGENT_TIMEOUT_VAR, DEFAULT_AGENT_TIMEOUT),
            machine_deadline: seconds_from_env(MACHINE_DEADLINE_VAR, DEFAULT_MACHINE_DEADLINE),
        }
    }
}

fn seconds_from_env(var: &str, default: Duration) -> Duration {
    let Ok(raw) = env::var(var) else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            log::warn!(target: "config", "ignoring invalid `{var}` value {raw:?}");
            default
        }
    }
}
