//! The chunked file-read protocol: `guest-file-open`, a bounded loop of
//! `guest-file-read`, and a `guest-file-close` guaranteed on every exit path.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::command::{FileCloseArgs, FileOpenArgs, FileReadArgs, FileReadReply};
use super::{AgentError, AgentSession, GuestAgent};

/// Bytes requested per `guest-file-read` command.
const READ_CHUNK_SIZE: usize = 2048;

/// Upper bound on read commands per file; keeps a misbehaving agent that
/// never reports EOF from spinning the session forever.
const MAX_READ_CHUNKS: usize = 10;

impl GuestAgent {
    /// Reads the full content of a file inside the guest.
    ///
    /// Holds the machine's session lock for the whole open/read/close
    /// sequence. The file handle is closed exactly once on every exit path;
    /// a failing close is logged and never masks the read outcome.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] if the open or a read round trip fails, a
    /// chunk's base64 payload cannot be decoded, or the agent still has not
    /// reported EOF after [`MAX_READ_CHUNKS`] reads ([`AgentError::ReadTimeout`];
    /// partial content is deliberately discarded rather than returned).
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, AgentError> {
        let session = self.session();
        let handle: i64 = session.call(
            "guest-file-open",
            Some(FileOpenArgs { path, mode: "r" }),
        )?;
        let file = OpenFile {
            session: &session,
            handle,
        };

        let mut content = Vec::new();
        for _ in 0..MAX_READ_CHUNKS {
            let chunk: FileReadReply = file.session.call(
                "guest-file-read",
                Some(FileReadArgs {
                    handle: file.handle,
                    count: READ_CHUNK_SIZE,
                }),
            )?;
            let data = BASE64
                .decode(chunk.buf_b64.as_bytes())
                .map_err(|source| AgentError::Base64 {
                    command: "guest-file-read",
                    source,
                })?;
            content.extend_from_slice(&data);
            if chunk.eof {
                return Ok(content);
            }
        }

        Err(AgentError::ReadTimeout {
            path: path.to_owned(),
            chunks: MAX_READ_CHUNKS,
        })
    }
}

/// An open guest file handle, closed on drop.
struct OpenFile<'a, 'b> {
    session: &'a AgentSession<'b>,
    handle: i64,
}

impl Drop for OpenFile<'_, '_> {
    fn drop(&mut self) {
        let result: Result<serde::de::IgnoredAny, _> = self.session.call(
            "guest-file-close",
            Some(FileCloseArgs {
                handle: self.handle,
            }),
        );
        if let Err(err) = result {
            log::debug!(target: "guest-agent", "failed to close guest file handle {}: {err}", self.handle);
        }
    }
}
