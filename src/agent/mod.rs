//! Guest-agent RPC: a synchronous command/response transport per machine and
//! the stateful mini-protocols built on top of it.
//!
//! The transport ([`AgentChannel`]) carries exactly one JSON command and one
//! JSON reply per call; it never retries. [`GuestAgent`] wraps a channel with
//! the configured per-call timeout and a session mutex: the chunked file-read
//! and exec-with-poll protocols each hold the lock for their whole session,
//! so concurrent collectors can never interleave commands on one machine.
//!
//! # Protocols
//!
//! - [`GuestAgent::capabilities`]: one `guest-info` round trip per machine
//!   per scrape, deciding which verbs the collectors may use.
//! - [`GuestAgent::read_file`]: `guest-file-open` → bounded chunk loop of
//!   `guest-file-read` → guaranteed `guest-file-close`.
//! - [`GuestAgent::exec`]: `guest-exec` → bounded `guest-exec-status`
//!   polling until the process exits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

mod capabilities;
mod command;
mod error;
mod exec;
mod readfile;

pub use capabilities::Capabilities;
pub use command::SupportedCommand;
pub use error::{AgentError, TransportError};

/// One synchronous command/response round trip to a machine's guest agent.
///
/// Implemented by the hypervisor backend (e.g. over the libvirt agent
/// passthrough). A call blocks for at most `timeout` and yields exactly one
/// reply or a [`TransportError`]; retrying is a protocol-layer concern and
/// must not happen here.
pub trait AgentChannel: Send + Sync {
    fn execute(&self, command: &str, timeout: Duration) -> Result<String, TransportError>;
}

/// Typed client for one machine's guest agent.
///
/// Owned by the scrape orchestrator for the duration of one scrape pass and
/// shared by that machine's collector workers.
pub struct GuestAgent {
    channel: Arc<dyn AgentChannel>,
    timeout: Duration,
    session: Mutex<()>,
}

impl GuestAgent {
    pub fn new(channel: Arc<dyn AgentChannel>, timeout: Duration) -> Self {
        Self {
            channel,
            timeout,
            session: Mutex::new(()),
        }
    }

    /// Acquires the per-machine session lock.
    ///
    /// All commands of one protocol session go through the returned handle;
    /// the lock is held until it is dropped.
    fn session(&self) -> AgentSession<'_> {
        AgentSession {
            agent: self,
            _guard: self
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// An exclusive command session with one machine's guest agent.
struct AgentSession<'a> {
    agent: &'a GuestAgent,
    _guard: MutexGuard<'a, ()>,
}

impl AgentSession<'_> {
    /// Sends one named command and decodes the `return` payload of the reply.
    fn call<A, R>(&self, command: &'static str, arguments: Option<A>) -> Result<R, AgentError>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(&command::AgentCommand { execute: command, arguments })
            .map_err(|source| AgentError::Encode { command, source })?;
        let reply = self.agent.channel.execute(&payload, self.agent.timeout)?;
        let reply: command::Reply<R> = serde_json::from_str(&reply)
            .map_err(|source| AgentError::Decode { command, source })?;
        Ok(reply.ret)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{AgentChannel, TransportError};

    /// An agent channel that replays a fixed script of replies and records
    /// every command it was sent.
    pub(crate) struct ScriptedChannel {
        replies: Mutex<VecDeque<Result<String, TransportError>>>,
        commands: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptedChannel {
        pub(crate) fn new(
            replies: impl IntoIterator<Item = Result<String, TransportError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                commands: Mutex::new(Vec::new()),
            })
        }

        /// Shorthand for a reply wrapping `ret` in `{"return": ...}`.
        pub(crate) fn reply(ret: serde_json::Value) -> Result<String, TransportError> {
            Ok(serde_json::json!({ "return": ret }).to_string())
        }

        /// Number of commands executed with the given name.
        pub(crate) fn executed(&self, name: &str) -> usize {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .filter(|cmd| cmd["execute"] == name)
                .count()
        }

        pub(crate) fn commands(&self) -> Vec<serde_json::Value> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl AgentChannel for ScriptedChannel {
        fn execute(&self, command: &str, _timeout: Duration) -> Result<String, TransportError> {
            self.commands
                .lock()
                .unwrap()
                .push(serde_json::from_str(command).expect("command must be valid JSON"));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError {
                        message: "reply script exhausted".to_owned(),
                    })
                })
        }
    }
}
