//! Subscriber Registry (spec.md §4.5): the set of active WebSocket
//! subscribers, shared by every Event Fan-Out and the WebSocket Handler.

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

/// Outbound frames delivered to one subscriber's write-pump.
pub type Outbound = mpsc::Sender<Vec<u8>>;
pub type OutboundReceiver = mpsc::Receiver<Vec<u8>>;

/// Bounded capacity for a subscriber's outbound queue (spec.md §4.4 "suggested 128").
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriberKind {
    Ticker,
    Execution,
}

impl SubscriberKind {
    #[must_use]
    pub fn matches_header(self, header_kind: &str) -> bool {
        match self {
            SubscriberKind::Ticker => header_kind.eq_ignore_ascii_case("TICKER"),
            SubscriberKind::Execution => header_kind.eq_ignore_ascii_case("EXECUTION"),
        }
    }
}

/// One active WebSocket subscription (spec.md §3 "Subscriber").
pub struct Subscriber {
    pub kind: SubscriberKind,
    pub venue: String,
    pub symbol: Option<String>,
    pub account: Option<String>,
    outbound: Outbound,
}

impl Subscriber {
    #[must_use]
    pub fn new(
        kind: SubscriberKind,
        venue: impl Into<String>,
        symbol: Option<String>,
        account: Option<String>,
    ) -> (Arc<Self>, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let subscriber = Arc::new(Self {
            kind,
            venue: venue.into(),
            symbol,
            account,
            outbound: tx,
        });
        (subscriber, rx)
    }

    /// Whether this subscriber wants an event with this header.
    #[must_use]
    pub fn matches(&self, header_kind: &str, account: &str, venue: &str, symbol: &str) -> bool {
        if !self.kind.matches_header(header_kind) {
            return false;
        }
        if self.kind == SubscriberKind::Execution {
            let Some(want) = self.account.as_deref() else {
                return false;
            };
            if want != account {
                return false;
            }
        }
        if self.venue != venue {
            return false;
        }
        match self.symbol.as_deref() {
            Some(want) if !want.is_empty() => want == symbol,
            _ => true,
        }
    }

    /// Non-blocking delivery attempt; returns `false` if the queue was full
    /// (the caller is expected to bump the drop-counter metric and move on).
    #[must_use]
    pub fn try_send(&self, payload: Vec<u8>) -> bool {
        self.outbound.try_send(payload).is_ok()
    }
}

/// Reader-writer-locked subscriber set (spec.md §4.5, §5 "Shared state").
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subscriber: Arc<Subscriber>) {
        self.subscribers
            .write()
            .expect("subscriber registry poisoned")
            .push(subscriber);
    }

    /// Identity-based removal with swap-remove, O(1). No-op if `subscriber`
    /// is not present.
    pub fn remove(&self, subscriber: &Arc<Subscriber>) {
        let mut guard = self.subscribers.write().expect("subscriber registry poisoned");
        if let Some(index) = guard.iter().position(|s| Arc::ptr_eq(s, subscriber)) {
            guard.swap_remove(index);
        }
    }

    /// Delivers `payload` to every subscriber matching the event header,
    /// dropping silently (and reporting back how many drops occurred) on a
    /// full queue.
    #[must_use]
    pub fn fan_out(&self, header_kind: &str, account: &str, venue: &str, symbol: &str, payload: &[u8]) -> usize {
        let guard = self.subscribers.read().expect("subscriber registry poisoned");
        let mut dropped = 0;
        for subscriber in guard.iter() {
            if subscriber.matches(header_kind, account, venue, symbol) && !subscriber.try_send(payload.to_vec()) {
                dropped += 1;
            }
        }
        dropped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().expect("subscriber registry poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_subscriber_requires_matching_account() {
        let (sub, _rx) = Subscriber::new(
            SubscriberKind::Execution,
            "TESTEX",
            None,
            Some("BOB".to_owned()),
        );
        assert!(sub.matches("EXECUTION", "BOB", "TESTEX", "FOOBAR"));
        assert!(!sub.matches("EXECUTION", "ALICE", "TESTEX", "FOOBAR"));
    }

    #[test]
    fn ticker_subscriber_ignores_account() {
        let (sub, _rx) = Subscriber::new(SubscriberKind::Ticker, "TESTEX", None, None);
        assert!(sub.matches("TICKER", "ANYONE", "TESTEX", "FOOBAR"));
        assert!(!sub.matches("EXECUTION", "ANYONE", "TESTEX", "FOOBAR"));
    }

    #[test]
    fn symbol_filter_is_optional() {
        let (sub, _rx) = Subscriber::new(
            SubscriberKind::Ticker,
            "TESTEX",
            Some("FOOBAR".to_owned()),
            None,
        );
        assert!(sub.matches("TICKER", "X", "TESTEX", "FOOBAR"));
        assert!(!sub.matches("TICKER", "X", "TESTEX", "OTHER"));
    }

    #[test]
    fn remove_is_idempotent_and_swap_removes() {
        let registry = SubscriberRegistry::new();
        let (a, _a_rx) = Subscriber::new(SubscriberKind::Ticker, "TESTEX", None, None);
        let (b, _b_rx) = Subscriber::new(SubscriberKind::Ticker, "TESTEX", None, None);
        registry.insert(Arc::clone(&a));
        registry.insert(Arc::clone(&b));
        assert_eq!(registry.len(), 2);

        registry.remove(&a);
        assert_eq!(registry.len(), 1);

        registry.remove(&a);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn fan_out_drops_silently_on_full_queue() {
        let (sub, _rx) = Subscriber::new(SubscriberKind::Ticker, "TESTEX", None, None);
        let registry = SubscriberRegistry::new();
        registry.insert(sub);

        let mut dropped = 0;
        for _ in 0..(SUBSCRIBER_QUEUE_CAPACITY + 5) {
            dropped += registry.fan_out("TICKER", "X", "TESTEX", "FOOBAR", b"payload\n");
        }
        assert!(dropped > 0);
    }
}
