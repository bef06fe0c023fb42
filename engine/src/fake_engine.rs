//! In-process fake matching engine, used only by tests (SPEC_FULL.md §8) to
//! drive a `BookActor`/`EventFanOut` pair through the real pipe protocol
//! without spawning a child process. Commands written to the fake's stdin
//! are echoed back verbatim, framed the way a real engine frames a textual
//! response; event lines pushed onto the returned sender are written to the
//! fake's stderr independently of the command/response stream, exactly like
//! a real engine interleaves unsolicited events with command replies.

#![cfg(test)]

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;

const DUPLEX_CAPACITY: usize = 8192;

/// The three streams a `BookActor`/`EventFanOut` pair needs: a writable
/// "stdin", a readable "stdout", and a readable "stderr".
pub(crate) struct FakeEngine {
    pub stdin: DuplexStream,
    pub stdout: DuplexStream,
    pub stderr: DuplexStream,
}

/// Spawns the fake engine's two background tasks and returns the adapter-
/// facing ends of its streams plus a sender for scripting stderr events.
pub(crate) fn spawn() -> (FakeEngine, mpsc::UnboundedSender<String>) {
    let (actor_stdin, engine_stdin) = tokio::io::duplex(DUPLEX_CAPACITY);
    let (engine_stdout, actor_stdout) = tokio::io::duplex(DUPLEX_CAPACITY);
    let (engine_stderr, actor_stderr) = tokio::io::duplex(DUPLEX_CAPACITY);
    let (events_tx, events_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(run_command_loop(engine_stdin, engine_stdout));
    tokio::spawn(run_event_loop(engine_stderr, events_rx));

    (FakeEngine { stdin: actor_stdin, stdout: actor_stdout, stderr: actor_stderr }, events_tx)
}

/// Reads one line per command and echoes it back as `ECHO <line>` followed
/// by the `END` terminator, matching the real engine's line-framed protocol.
async fn run_command_loop(stdin: DuplexStream, mut stdout: DuplexStream) {
    let mut reader = BufReader::new(stdin);
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let reply = format!("ECHO {}\nEND\n", line.trim_end_matches(['\n', '\r']));
        if stdout.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Writes every scripted event line (already including its own terminator)
/// to stderr as it arrives, unsolicited and independent of the command loop.
async fn run_event_loop(mut stderr: DuplexStream, mut events: mpsc::UnboundedReceiver<String>) {
    while let Some(event) = events.recv().await {
        if stderr.write_all(event.as_bytes()).await.is_err() {
            break;
        }
    }
}
