//! Capability negotiation: one `guest-info` round trip deciding which
//! guest-agent verbs the collectors may use on a machine.

use super::command::{GuestInfoReply, SupportedCommand};
use super::{AgentError, GuestAgent};

/// Guest-agent verbs available on one machine.
///
/// Negotiated once per machine per scrape and never cached across passes;
/// agent availability inside a guest can change at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub guest_file_read: bool,
    pub guest_exec: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        guest_file_read: false,
        guest_exec: false,
    };

    const ALL: Self = Self {
        guest_file_read: true,
        guest_exec: true,
    };

    /// Derives capabilities from a `guest-info` supported-commands list.
    ///
    /// Default-on policy: both flags start true, and only an entry that is
    /// present with `enabled: false` clears a flag. A command absent from
    /// the list counts as enabled; an empty list therefore enables
    /// everything.
    fn from_supported(commands: &[SupportedCommand]) -> Self {
        let mut caps = Self::ALL;
        for command in commands {
            if command.enabled {
                continue;
            }
            match command.name.as_str() {
                "guest-file-open" | "guest-file-read" | "guest-file-close" => {
                    caps.guest_file_read = false;
                }
                "guest-exec" | "guest-exec-status" => {
                    caps.guest_exec = false;
                }
                _ => {}
            }
        }
        caps
    }
}

impl GuestAgent {
    /// Negotiates the machine's capabilities.
    ///
    /// Any transport or decode failure yields [`Capabilities::NONE`]: the
    /// collectors then skip guest-sourced metrics for this machine instead
    /// of failing the scrape.
    pub fn capabilities(&self) -> Capabilities {
        let session = self.session();
        match session.call::<(), GuestInfoReply>("guest-info", None) {
            Ok(info) => Capabilities::from_supported(&info.supported_commands),
            Err(err) => {
                log::debug!(target: "guest-agent", "capability negotiation failed: {err}");
                Capabilities::NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::super::testing::ScriptedChannel;
    use super::super::{AgentChannel, TransportError};
    use super::*;

    fn agent(channel: Arc<ScriptedChannel>) -> GuestAgent {
        GuestAgent::new(channel as Arc<dyn AgentChannel>, Duration::from_secs(3))
    }

    #[test]
    fn test_empty_command_list_enables_everything() {
        let channel = ScriptedChannel::new([ScriptedChannel::reply(serde_json::json!({
            "version": "5.2.0",
            "supported_commands": [],
        }))]);
        assert_eq!(agent(channel).capabilities(), Capabilities::ALL);
    }

    #[test]
    fn test_explicitly_disabled_exec_clears_only_exec() {
        let channel = ScriptedChannel::new([ScriptedChannel::reply(serde_json::json!({
            "supported_commands": [
                { "name": "guest-exec", "enabled": false, "success-response": true },
                { "name": "guest-file-read", "enabled": true, "success-response": true },
            ],
        }))]);
        let caps = agent(channel).capabilities();
        assert!(!caps.guest_exec);
        assert!(caps.guest_file_read);
    }

    #[test]
    fn test_any_disabled_file_command_clears_file_read() {
        let channel = ScriptedChannel::new([ScriptedChannel::reply(serde_json::json!({
            "supported_commands": [
                { "name": "guest-file-close", "enabled": false },
            ],
        }))]);
        let caps = agent(channel).capabilities();
        assert!(!caps.guest_file_read);
        assert!(caps.guest_exec);
    }

    #[test]
    fn test_unrelated_disabled_command_is_ignored() {
        let channel = ScriptedChannel::new([ScriptedChannel::reply(serde_json::json!({
            "supported_commands": [
                { "name": "guest-shutdown", "enabled": false },
            ],
        }))]);
        assert_eq!(agent(channel).capabilities(), Capabilities::ALL);
    }

    #[test]
    fn test_transport_error_yields_none() {
        let channel = ScriptedChannel::new([Err(TransportError {
            message: "agent not connected".to_owned(),
        })]);
        assert_eq!(agent(channel).capabilities(), Capabilities::NONE);
    }

    #[test]
    fn test_undecodable_reply_yields_none() {
        let channel = ScriptedChannel::new([Ok("{\"return\": 42}".to_owned())]);
        assert_eq!(agent(channel).capabilities(), Capabilities::NONE);
    }
}
