//! The exec-with-poll protocol: `guest-exec` spawns a process in the guest,
//! then `guest-exec-status` is polled until the process exits or the retry
//! budget runs out.
//!
//! The session is a small state machine: `Running` until the agent reports
//! `exited: true`, then terminal on exit code zero (captured stdout) or
//! non-zero (captured stderr as the error payload). Exhausting the poll
//! budget is a timeout.

use std::thread;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::command::{ExecArgs, ExecReply, ExecStatusArgs, ExecStatusReply};
use super::{AgentError, GuestAgent};

/// Maximum number of `guest-exec-status` polls per exec session.
const EXEC_STATUS_POLLS: usize = 10;

/// Delay between two status polls.
const EXEC_POLL_DELAY: Duration = Duration::from_millis(200);

impl GuestAgent {
    /// Runs a program inside the guest and returns its captured stdout.
    ///
    /// Holds the machine's session lock for the whole exec/poll sequence.
    ///
    /// # Errors
    ///
    /// - [`AgentError::ExecFailed`] if the process exited non-zero; the
    ///   error carries the decoded stderr.
    /// - [`AgentError::ExecTimeout`] if the process has not exited after
    ///   [`EXEC_STATUS_POLLS`] polls.
    /// - Transport and decode errors of the underlying round trips.
    pub fn exec(
        &self,
        path: &str,
        args: &[&str],
        capture_output: bool,
    ) -> Result<Vec<u8>, AgentError> {
        let session = self.session();
        let spawned: ExecReply = session.call(
            "guest-exec",
            Some(ExecArgs {
                path,
                arg: args,
                capture_output,
            }),
        )?;

        for attempt in 1..=EXEC_STATUS_POLLS {
            let status: ExecStatusReply =
                session.call("guest-exec-status", Some(ExecStatusArgs { pid: spawned.pid }))?;
            if !status.exited {
                // No sleep after the final poll; the timeout verdict is
                // already in.
                if attempt < EXEC_STATUS_POLLS {
                    thread::sleep(EXEC_POLL_DELAY);
                }
                continue;
            }

            let exit_code = status.exit_code.unwrap_or(0);
            if exit_code != 0 {
                let stderr = decode_output(status.err_data)?;
                return Err(AgentError::ExecFailed {
                    path: path.to_owned(),
                    exit_code,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                });
            }
            return decode_output(status.out_data);
        }

        Err(AgentError::ExecTimeout {
            path: path.to_owned(),
            pid: spawned.pid,
            polls: EXEC_STATUS_POLLS,
        })
    }
}

/// Decodes a base64 output field; an absent field is empty output.
fn decode_output(data: Option<String>) -> Result<Vec<u8>, AgentError> {
    match data {
        None => Ok(Vec::new()),
        Some(b64) => BASE64
            .decode(b64.as_bytes())
            .map_err(|source| AgentError::Base64 {
                command: "guest-exec-status",
                source,
            }),
    }
}
