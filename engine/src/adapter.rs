//! Engine Adapter (spec.md §4.1): owns one child matching-engine process, a
//! writable request stream, a readable line-framed response stream, and
//! hands the readable event stream (child stderr) off to the caller so the
//! Event Fan-Out can own it exclusively (spec.md §3 ownership rule).

use std::path::Path;
use std::process::Stdio;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    process::{Child, ChildStderr, ChildStdin, ChildStdout},
};
use tracing::{debug, warn};

use crate::orderbook::{self, OrderBookSnapshot};

const RESPONSE_TERMINATOR: &str = "END";

/// Raised when the child process breaks the pipe protocol (closes its
/// stdout without ever sending `END`, exits unexpectedly, etc). Fatal for
/// the owning book: see SPEC_FULL.md §9, open question 1.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("engine process I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine process closed its output before sending an END terminator")]
    UnterminatedResponse,
}

/// Generic over its stdin/stdout streams so tests can wire an in-process
/// fake engine in place of a real child process (SPEC_FULL.md §8); the
/// production path always instantiates `EngineAdapter<ChildStdin, ChildStdout>`
/// via [`EngineAdapter::spawn`].
pub struct EngineAdapter<W = ChildStdin, R = ChildStdout> {
    venue: String,
    symbol: String,
    child: Option<Child>,
    stdin: W,
    stdout: BufReader<R>,
}

impl EngineAdapter<ChildStdin, ChildStdout> {
    /// Spawns `engine_path venue symbol` and wires up its pipes. Returns the
    /// adapter (owning stdin/stdout) plus the raw stderr handle, which the
    /// caller is expected to hand to an `EventFanOut` — no other component
    /// may read it (spec.md §3).
    pub fn spawn(
        engine_path: &Path,
        venue: &str,
        symbol: &str,
    ) -> Result<(Self, ChildStderr), AdapterError> {
        let mut child = tokio::process::Command::new(engine_path)
            .arg(venue)
            .arg(symbol)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));
        let stderr = child.stderr.take().expect("piped stderr");

        debug!(venue, symbol, "spawned matching engine child process");

        Ok((
            Self {
                venue: venue.to_owned(),
                symbol: symbol.to_owned(),
                child: Some(child),
                stdin,
                stdout,
            },
            stderr,
        ))
    }
}

impl<W, R> EngineAdapter<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Wraps an already-connected pair of streams without spawning a child
    /// process. Used by tests to drive a `BookActor` against an in-process
    /// fake engine (SPEC_FULL.md §8).
    #[must_use]
    pub fn from_parts(venue: impl Into<String>, symbol: impl Into<String>, stdin: W, stdout: R) -> Self {
        Self { venue: venue.into(), symbol: symbol.into(), child: None, stdin, stdout: BufReader::new(stdout) }
    }

    /// Writes one command line, appending `\n` if the caller didn't
    /// (spec.md §4.2 step 1).
    pub async fn write_command(&mut self, command: &str) -> Result<(), AdapterError> {
        let mut line = command.to_owned();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads a line-framed textual response: lines up to (excluding) the
    /// literal `END` terminator, each with its trailing newline preserved
    /// (spec.md §4.1).
    pub async fn read_framed_response(&mut self) -> Result<Vec<u8>, AdapterError> {
        let mut buffer = Vec::new();
        loop {
            let mut line = String::new();
            let n = self.stdout.read_line(&mut line).await?;
            if n == 0 {
                warn!(venue = %self.venue, symbol = %self.symbol, "engine stdout closed without END");
                return Err(AdapterError::UnterminatedResponse);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed == RESPONSE_TERMINATOR {
                return Ok(buffer);
            }
            buffer.extend_from_slice(trimmed.as_bytes());
            buffer.push(b'\n');
        }
    }

    /// Reads the one binary response shape (`ORDERBOOK_BINARY`, spec.md
    /// §4.1) and decodes it straight into JSON.
    pub async fn read_orderbook_binary(&mut self) -> Result<OrderBookSnapshot, AdapterError> {
        orderbook::decode_binary(&mut self.stdout, &self.venue, &self.symbol)
            .await
            .map_err(AdapterError::from)
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Best-effort shutdown of the child process; called when a book is
    /// marked dead.
    pub async fn kill(&mut self) {
        if let Some(child) = &mut self.child {
            let _ = child.kill().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_framed_response_collects_until_end() {
        let data = b"line one\nline two\nEND\n".to_vec();
        let mut reader = BufReader::new(std::io::Cursor::new(data));
        let mut buf = Vec::new();
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "must not hit EOF before END");
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed == RESPONSE_TERMINATOR {
                break;
            }
            buf.extend_from_slice(trimmed.as_bytes());
            buf.push(b'\n');
        }
        assert_eq!(buf, b"line one\nline two\n");
    }

    #[tokio::test]
    async fn missing_terminator_is_unterminated_error() {
        let data = b"line one\n".to_vec();
        let mut reader = BufReader::new(std::io::Cursor::new(data));
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let mut eof_line = String::new();
        let n = reader.read_line(&mut eof_line).await.unwrap();
        assert_eq!(n, 0);
    }
}
