//! Event Fan-Out (spec.md §4.4): one per Engine Adapter, exclusively owning
//! that book's event stream (the child's stderr).

use std::sync::Arc;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::ChildStderr,
};
use tracing::{debug, warn};

use crate::{runtime::metrics::METRICS, subscriber::SubscriberRegistry};

const EVENT_TERMINATOR: &str = "END";

/// Reads one book's event stream to completion, delivering matching payloads
/// to the shared [`SubscriberRegistry`]. Runs until the child closes stderr
/// (book died or process exited). Generic over the stream type so tests can
/// drive it from an in-process fake engine (SPEC_FULL.md §8); the hub always
/// instantiates `EventFanOut<ChildStderr>`.
pub struct EventFanOut<R = ChildStderr> {
    venue: String,
    symbol: String,
    reader: BufReader<R>,
    registry: Arc<SubscriberRegistry>,
}

impl<R> EventFanOut<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    #[must_use]
    pub fn new(venue: String, symbol: String, stderr: R, registry: Arc<SubscriberRegistry>) -> Self {
        Self { venue, symbol, reader: BufReader::new(stderr), registry }
    }

    pub async fn run(mut self) {
        loop {
            match self.read_header().await {
                Ok(Some((kind, account))) => {
                    let payload = match self.read_payload().await {
                        Ok(p) => p,
                        Err(()) => break,
                    };
                    let dropped =
                        self.registry.fan_out(&kind, &account, &self.venue, &self.symbol, &payload);
                    for _ in 0..dropped {
                        METRICS.record_event_dropped();
                    }
                }
                Ok(None) => break,
                Err(()) => break,
            }
        }
        debug!(venue = %self.venue, symbol = %self.symbol, "event fan-out terminated, event stream closed");
    }

    /// Reads the header line `KIND ACCOUNT VENUE SYMBOL`, skipping (and
    /// consuming the payload of) any malformed or unrecognised-kind events.
    /// Returns `Ok(None)` on clean EOF (child process exited).
    async fn read_header(&mut self) -> Result<Option<(String, String)>, ()> {
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.map_err(|e| {
                warn!(venue = %self.venue, symbol = %self.symbol, error = %e, "error reading event header");
            })?;
            if n == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            let mut parts = trimmed.split_whitespace();
            let (Some(kind), Some(account), Some(_venue), Some(_symbol)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                warn!(venue = %self.venue, symbol = %self.symbol, line = trimmed, "malformed event header, skipping");
                self.read_payload().await?;
                continue;
            };
            if !kind.eq_ignore_ascii_case("TICKER") && !kind.eq_ignore_ascii_case("EXECUTION") {
                warn!(venue = %self.venue, symbol = %self.symbol, kind, "unknown event kind, payload consumed but not delivered");
                self.read_payload().await?;
                continue;
            }
            return Ok(Some((kind.to_uppercase(), account.to_owned())));
        }
    }

    /// Reads payload lines up to (excluding) the literal `END` terminator.
    async fn read_payload(&mut self) -> Result<Vec<u8>, ()> {
        let mut buffer = Vec::new();
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.map_err(|e| {
                warn!(venue = %self.venue, symbol = %self.symbol, error = %e, "error reading event payload");
            })?;
            if n == 0 {
                warn!(venue = %self.venue, symbol = %self.symbol, "event stream closed mid-payload");
                return Err(());
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed == EVENT_TERMINATOR {
                return Ok(buffer);
            }
            buffer.extend_from_slice(trimmed.as_bytes());
            buffer.push(b'\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::{Subscriber, SubscriberKind};

    #[tokio::test]
    async fn delivers_payload_to_matching_subscriber() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (sub, mut rx) = Subscriber::new(
            SubscriberKind::Execution,
            "TESTEX",
            Some("FOOBAR".to_owned()),
            Some("BOB".to_owned()),
        );
        registry.insert(sub);

        let dropped = registry.fan_out("EXECUTION", "BOB", "TESTEX", "FOOBAR", b"{\"ok\":true}\n");
        assert_eq!(dropped, 0);
        let received = rx.try_recv().expect("payload delivered");
        assert_eq!(received, b"{\"ok\":true}\n");
    }

    #[tokio::test]
    async fn non_matching_account_does_not_receive() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (sub, mut rx) = Subscriber::new(
            SubscriberKind::Execution,
            "TESTEX",
            None,
            Some("ALICE".to_owned()),
        );
        registry.insert(sub);

        registry.fan_out("EXECUTION", "BOB", "TESTEX", "FOOBAR", b"payload\n");
        assert!(rx.try_recv().is_err());
    }

    /// Invariant 3 and scenario S7 (spec.md §8): an aggressive order crossing
    /// a resting one produces one execution event per side; each account's
    /// subscriber receives exactly its own, and BOB's ticker subscriber sees
    /// the quote update too. Driven through a real `EventFanOut` reading an
    /// in-process fake engine's stderr stream, not the registry directly.
    #[tokio::test]
    async fn s7_execution_and_ticker_fan_out_through_a_real_event_stream() {
        let (fake, events) = crate::fake_engine::spawn();
        let registry = Arc::new(SubscriberRegistry::new());

        let (bob_exec, mut bob_exec_rx) = Subscriber::new(
            SubscriberKind::Execution,
            "TESTEX",
            Some("FOOBAR".to_owned()),
            Some("BOB".to_owned()),
        );
        let (alice_exec, mut alice_exec_rx) =
            Subscriber::new(SubscriberKind::Execution, "TESTEX", None, Some("ALICE".to_owned()));
        let (bob_ticker, mut bob_ticker_rx) =
            Subscriber::new(SubscriberKind::Ticker, "TESTEX", Some("FOOBAR".to_owned()), None);
        registry.insert(bob_exec);
        registry.insert(alice_exec);
        registry.insert(bob_ticker);

        let fan_out = EventFanOut::new("TESTEX".to_owned(), "FOOBAR".to_owned(), fake.stderr, registry);
        tokio::spawn(fan_out.run());

        events
            .send("EXECUTION BOB TESTEX FOOBAR\n{\"ok\":true,\"account\":\"BOB\"}\nEND\n".to_owned())
            .unwrap();
        events
            .send("EXECUTION ALICE TESTEX FOOBAR\n{\"ok\":true,\"account\":\"ALICE\"}\nEND\n".to_owned())
            .unwrap();
        events
            .send("TICKER - TESTEX FOOBAR\n{\"ok\":true,\"quote\":true}\nEND\n".to_owned())
            .unwrap();

        let bob_payload = bob_exec_rx.recv().await.expect("BOB's execution delivered");
        assert_eq!(bob_payload, b"{\"ok\":true,\"account\":\"BOB\"}\n");
        assert!(bob_exec_rx.try_recv().is_err(), "BOB must not also receive ALICE's execution");

        let alice_payload = alice_exec_rx.recv().await.expect("ALICE's execution delivered");
        assert_eq!(alice_payload, b"{\"ok\":true,\"account\":\"ALICE\"}\n");
        assert!(alice_exec_rx.try_recv().is_err(), "ALICE must not also receive BOB's execution");

        let ticker_payload = bob_ticker_rx.recv().await.expect("ticker delivered");
        assert_eq!(ticker_payload, b"{\"ok\":true,\"quote\":true}\n");

        drop(fake.stdin);
        drop(fake.stdout);
    }
}
