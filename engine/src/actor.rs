//! Book Actor (spec.md §4.2): the serialized command processor bound to one
//! Engine Adapter. Structural at-most-one-in-flight guarantee — the loop
//! below never starts a new command until the previous one's reply has been
//! sent, by construction (not by discipline).

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::{
    adapter::EngineAdapter,
    command::{BookCommand, BookPayload, EngineReply},
    error::ApiError,
    runtime::metrics::METRICS,
};

const SCORES_COMMAND: &str = "__SCORES__";

/// Generic over the adapter's stdin/stdout streams so tests can drive the
/// actor loop against an in-process fake engine (SPEC_FULL.md §8); the hub
/// always instantiates `BookActor<ChildStdin, ChildStdout>`.
pub struct BookActor<W = ChildStdin, R = ChildStdout> {
    adapter: EngineAdapter<W, R>,
    inbox: mpsc::Receiver<BookCommand>,
}

impl<W, R> BookActor<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    #[must_use]
    pub fn new(adapter: EngineAdapter<W, R>, inbox: mpsc::Receiver<BookCommand>) -> Self {
        Self { adapter, inbox }
    }

    /// Runs the actor loop to completion. Returns once the inbox is closed
    /// (hub dropped the last sender) or the engine adapter reports a fatal
    /// protocol error, in which case the book is considered dead and the
    /// child process is killed.
    pub async fn run(mut self) {
        let venue = self.adapter.venue().to_owned();
        let symbol = self.adapter.symbol().to_owned();

        while let Some(command) = self.inbox.recv().await {
            let outcome = self.process(command).await;
            if outcome.is_err() {
                error!(venue, symbol, "book actor terminating after engine protocol error");
                self.adapter.kill().await;
                return;
            }
        }

        warn!(venue, symbol, "book actor inbox closed, engine process will be dropped");
    }

    /// Processes one command, always delivering exactly one reply.
    /// Returns `Err(())` if the engine adapter hit a fatal protocol error
    /// (the reply has already been sent with `ApiError::EngineProtocolError`).
    async fn process(&mut self, command: BookCommand) -> Result<(), ()> {
        let BookCommand { payload, reply, .. } = command;

        let wire = payload.wire_command().to_owned();
        if let Err(e) = self.adapter.write_command(&wire).await {
            warn!(error = %e, "failed writing to engine stdin");
            let _ = reply.send(Err(ApiError::EngineProtocolError));
            return Err(());
        }

        let result = match payload {
            BookPayload::OrderBookBinary => self
                .adapter
                .read_orderbook_binary()
                .await
                .map(EngineReply::OrderBook),
            BookPayload::Raw(ref cmd) => self.adapter.read_framed_response().await.map(|bytes| {
                if cmd.trim() == SCORES_COMMAND {
                    EngineReply::Html(bytes)
                } else {
                    EngineReply::Json(bytes)
                }
            }),
        };

        METRICS.record_command(self.adapter.venue(), self.adapter.symbol());

        match result {
            Ok(engine_reply) => {
                let _ = reply.send(Ok(engine_reply));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed reading engine response");
                let _ = reply.send(Err(ApiError::EngineProtocolError));
                Err(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::fake_engine;

    /// Invariant 2 (spec.md §8): replies are emitted in the order requests
    /// were accepted. Sends two commands back to back without awaiting the
    /// first reply before issuing the second, then asserts the replies still
    /// resolve in issuance order.
    #[tokio::test]
    async fn replies_are_emitted_in_request_acceptance_order() {
        let (fake, _events) = fake_engine::spawn();
        let adapter = EngineAdapter::from_parts("TESTEX", "FOOBAR", fake.stdin, fake.stdout);
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(BookActor::new(adapter, rx).run());

        let (reply1_tx, reply1_rx) = oneshot::channel();
        let (reply2_tx, reply2_rx) = oneshot::channel();
        tx.send(BookCommand {
            key: crate::book::BookKey::new("TESTEX", "FOOBAR"),
            payload: BookPayload::Raw("QUOTE 1".to_owned()),
            create_if_missing: true,
            reply: reply1_tx,
        })
        .await
        .unwrap();
        tx.send(BookCommand {
            key: crate::book::BookKey::new("TESTEX", "FOOBAR"),
            payload: BookPayload::Raw("QUOTE 2".to_owned()),
            create_if_missing: true,
            reply: reply2_tx,
        })
        .await
        .unwrap();

        let EngineReply::Json(first) = reply1_rx.await.unwrap().unwrap() else {
            panic!("expected json reply")
        };
        let EngineReply::Json(second) = reply2_rx.await.unwrap().unwrap() else {
            panic!("expected json reply")
        };
        assert_eq!(first, b"ECHO QUOTE 1\n");
        assert_eq!(second, b"ECHO QUOTE 2\n");
    }

    /// A fatal engine protocol error (stdout closed mid-response) answers
    /// the in-flight command with `EngineProtocolError` and terminates the
    /// actor, matching SPEC_FULL.md §9 open question 1.
    #[tokio::test]
    async fn protocol_error_terminates_actor_after_answering_in_flight_command() {
        let (fake, _events) = fake_engine::spawn();
        // An already-closed duplex end reads as immediate EOF, standing in
        // for an engine that closed stdout without ever sending `END`.
        let (closed_stdout, remote) = tokio::io::duplex(8);
        drop(remote);
        let adapter = EngineAdapter::from_parts("TESTEX", "FOOBAR", fake.stdin, closed_stdout);
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(BookActor::new(adapter, rx).run());

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(BookCommand {
            key: crate::book::BookKey::new("TESTEX", "FOOBAR"),
            payload: BookPayload::Raw("QUOTE".to_owned()),
            create_if_missing: true,
            reply: reply_tx,
        })
        .await
        .unwrap();

        let result = reply_rx.await.unwrap();
        assert_eq!(result, Err(ApiError::EngineProtocolError));
    }
}
