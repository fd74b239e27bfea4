//! Wire types for the guest-agent JSON protocol.
//!
//! Field names follow the QEMU guest agent schema exactly (`buf-b64`,
//! `out-data`, `capture-output`, ...); every reply wraps its payload in a
//! `return` object.

use serde::{Deserialize, Serialize};

/// Envelope for an outgoing command.
#[derive(Debug, Serialize)]
pub(super) struct AgentCommand<A> {
    pub execute: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<A>,
}

/// Envelope for an incoming reply.
#[derive(Debug, Deserialize)]
pub(super) struct Reply<R> {
    #[serde(rename = "return")]
    pub ret: R,
}

#[derive(Debug, Serialize)]
pub(super) struct FileOpenArgs<'a> {
    pub path: &'a str,
    pub mode: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct FileReadArgs {
    pub handle: i64,
    pub count: usize,
}

/// One chunk of a file read. The agent also reports a `count` field; the
/// decoded payload length is authoritative, so it is not modeled here.
#[derive(Debug, Deserialize)]
pub(super) struct FileReadReply {
    #[serde(rename = "buf-b64", default)]
    pub buf_b64: String,
    #[serde(default)]
    pub eof: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct FileCloseArgs {
    pub handle: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ExecArgs<'a> {
    pub path: &'a str,
    pub arg: &'a [&'a str],
    #[serde(rename = "capture-output")]
    pub capture_output: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExecReply {
    pub pid: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ExecStatusArgs {
    pub pid: i64,
}

/// Status of a spawned guest process.
///
/// `exitcode` and the captured output are only meaningful once `exited` is
/// true; the agent omits absent fields rather than sending null.
#[derive(Debug, Deserialize)]
pub(super) struct ExecStatusReply {
    #[serde(default)]
    pub exited: bool,
    #[serde(rename = "exitcode", default)]
    pub exit_code: Option<i64>,
    #[serde(rename = "out-data", default)]
    pub out_data: Option<String>,
    #[serde(rename = "err-data", default)]
    pub err_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GuestInfoReply {
    #[serde(default)]
    pub supported_commands: Vec<SupportedCommand>,
}

/// One entry of the `guest-info` supported-commands list.
#[derive(Debug, Clone, Deserialize)]
pub struct SupportedCommand {
    pub name: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(rename = "success-response", default)]
    pub success_response: bool,
}

/// Commands missing an `enabled` field count as enabled (default-on policy).
fn enabled_default() -> bool {
    true
}
