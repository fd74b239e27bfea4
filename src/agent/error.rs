use thiserror::Error;

/// A guest-agent round trip failed or timed out.
///
/// Produced by [`AgentChannel`](super::AgentChannel) implementations; the
/// hypervisor error text is carried verbatim. Never retried at this layer.
#[derive(Debug, Error)]
#[error("guest agent round trip failed: {message}")]
pub struct TransportError {
    pub message: String,
}

/// Errors of the protocol layer on top of the transport.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode `{command}` command: {source}")]
    Encode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode `{command}` reply: {source}")]
    Decode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode base64 payload of `{command}` reply: {source}")]
    Base64 {
        command: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("failed to fetch guest file `{path}`: no EOF after {chunks} chunks")]
    ReadTimeout { path: String, chunks: usize },

    #[error("exec of `{path}` (pid {pid}) did not complete within {polls} status polls")]
    ExecTimeout {
        path: String,
        pid: i64,
        polls: usize,
    },

    #[error("exec of `{path}` exited with code {exit_code}: {stderr}")]
    ExecFailed {
        path: String,
        exit_code: i64,
        stderr: String,
    },
}
