//! Hub (spec.md §4.3): the single-owner task holding the book map, paired
//! with a `HubView` read-model task that answers global queries without
//! touching the map.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::{
    account::AccountIdTable,
    actor::BookActor,
    adapter::EngineAdapter,
    book::is_valid_name,
    command::{BookCommand, BookPayload, HubQuery, HubRequest, Reply},
    config::HubConfig,
    error::ApiError,
    fanout::EventFanOut,
    runtime::metrics::METRICS,
    subscriber::SubscriberRegistry,
};

/// Bounded inbox depth for a single book actor and for the hub itself.
const CHANNEL_CAPACITY: usize = 256;

/// A notification from the `Hub` task to the `HubView` task, or a query
/// forwarded from the hub's own inbox. Delivered on one channel so ordering
/// between "book created" and a later query is preserved (SPEC_FULL.md §9,
/// open question 4).
enum ViewMessage {
    BookCreated { venue: String, symbol: String },
    Query { query: HubQuery, reply: Reply },
}

/// Read-model of the `{venue -> {symbol}}` universe. Answers
/// `VENUES_LIST`/`VENUE_HEARTBEAT`/`STOCK_LIST` without ever touching the
/// Hub's book map.
pub struct HubView {
    inbox: mpsc::Receiver<ViewMessage>,
    venues: HashMap<String, Vec<String>>,
}

impl HubView {
    pub async fn run(mut self) {
        while let Some(message) = self.inbox.recv().await {
            match message {
                ViewMessage::BookCreated { venue, symbol } => {
                    let symbols = self.venues.entry(venue).or_default();
                    if !symbols.contains(&symbol) {
                        symbols.push(symbol);
                    }
                }
                ViewMessage::Query { query, reply } => {
                    let _ = reply.send(Ok(self.answer(query)));
                }
            }
        }
        warn!("hub view inbox closed, terminating");
    }

    fn answer(&self, query: HubQuery) -> crate::command::EngineReply {
        let body = match query {
            HubQuery::VenuesList => {
                let venues: Vec<_> = self.venues.keys().cloned().collect();
                serde_json::json!({ "ok": true, "venues": venues })
            }
            HubQuery::VenueHeartbeat { venue } => {
                serde_json::json!({ "ok": self.venues.contains_key(&venue), "venue": venue })
            }
            HubQuery::StockList { venue } => match self.venues.get(&venue) {
                Some(symbols) => serde_json::json!({ "ok": true, "symbols": symbols }),
                None => serde_json::json!({ "ok": false, "error": ApiError::UnknownVenue.to_string() }),
            },
        };
        crate::command::EngineReply::Json(serde_json::to_vec(&body).expect("json encode never fails"))
    }
}

/// Cloneable handle used by callers (the `http` crate, `cli` startup) to
/// submit book commands and hub queries.
#[derive(Clone)]
pub struct HubHandle {
    inbox: mpsc::Sender<HubRequest>,
    pub accounts: Arc<AccountIdTable>,
    pub subscribers: Arc<SubscriberRegistry>,
}

impl HubHandle {
    /// Routes a command to a book, optionally creating it. Mirrors spec.md
    /// §4.3 "Routed command".
    pub async fn send_book_command(
        &self,
        venue: &str,
        symbol: &str,
        payload: BookPayload,
        create_if_missing: bool,
    ) -> Result<crate::command::EngineReply, ApiError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = BookCommand {
            key: crate::book::BookKey::new(venue, symbol),
            payload,
            create_if_missing,
            reply: reply_tx,
        };
        self.inbox
            .send(HubRequest::Book(command))
            .await
            .map_err(|_| ApiError::EngineProtocolError)?;
        reply_rx.await.map_err(|_| ApiError::EngineProtocolError)?
    }

    pub async fn query(&self, query: HubQuery) -> Result<crate::command::EngineReply, ApiError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbox
            .send(HubRequest::Query { query, reply: reply_tx })
            .await
            .map_err(|_| ApiError::EngineProtocolError)?;
        reply_rx.await.map_err(|_| ApiError::EngineProtocolError)?
    }
}

/// Resolves an account name from its integer ID via the auxiliary
/// `__ACC_FROM_ID__` book command (spec.md §4.6 cancel/status flow).
pub fn acc_from_id_command(id: usize) -> BookPayload {
    BookPayload::Raw(format!("__ACC_FROM_ID__ {id}"))
}

pub struct Hub {
    inbox: mpsc::Receiver<HubRequest>,
    books: HashMap<String, HashMap<String, mpsc::Sender<BookCommand>>>,
    book_count: usize,
    max_books: usize,
    engine_path: PathBuf,
    subscribers: Arc<SubscriberRegistry>,
    view_tx: mpsc::Sender<ViewMessage>,
}

impl Hub {
    /// Builds the hub together with its paired `HubView`, a cloneable
    /// `HubHandle`, and the accounts table, ready to be spawned as two
    /// long-lived tasks.
    #[must_use]
    pub fn new(config: &HubConfig) -> (Self, HubView, HubHandle) {
        let (inbox_tx, inbox_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (view_tx, view_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let subscribers = Arc::new(SubscriberRegistry::new());
        let accounts = Arc::new(AccountIdTable::new());

        let hub = Self {
            inbox: inbox_rx,
            books: HashMap::new(),
            book_count: 0,
            max_books: config.max_books,
            engine_path: config.engine_path.clone(),
            subscribers: Arc::clone(&subscribers),
            view_tx,
        };
        let view = HubView { inbox: view_rx, venues: HashMap::new() };
        let handle = HubHandle { inbox: inbox_tx, accounts, subscribers };
        (hub, view, handle)
    }

    pub async fn run(mut self) {
        while let Some(request) = self.inbox.recv().await {
            match request {
                HubRequest::Book(command) => self.handle_book_command(command).await,
                HubRequest::Query { query, reply } => {
                    if self.view_tx.send(ViewMessage::Query { query, reply }).await.is_err() {
                        warn!("hub view unreachable, query dropped");
                    }
                }
            }
        }
        warn!("hub inbox closed, terminating");
    }

    async fn handle_book_command(&mut self, command: BookCommand) {
        let BookCommand { key, payload, create_if_missing, reply } = command;

        let existing = self.books.get(&key.venue).and_then(|symbols| symbols.get(&key.symbol)).cloned();

        let sender = match existing {
            Some(sender) => sender,
            None if !create_if_missing => {
                let err = if self.books.contains_key(&key.venue) {
                    ApiError::UnknownSymbol
                } else {
                    ApiError::UnknownVenue
                };
                let _ = reply.send(Err(err));
                return;
            }
            None => match self.create_book(&key.venue, &key.symbol).await {
                Ok(sender) => sender,
                Err(err) => {
                    let _ = reply.send(Err(err));
                    return;
                }
            },
        };

        let forwarded = BookCommand { key, payload, create_if_missing, reply };
        if sender.send(forwarded).await.is_err() {
            // The book actor terminated (dead book) between lookup and send;
            // there's no reply channel left to use since it moved into the
            // failed send. The caller's request simply times out as a
            // dropped oneshot, observed as `EngineProtocolError` upstream.
        }
    }

    /// Spec.md §4.3 "create-if-missing" steps 1-4, bad-name precedence over
    /// capacity (§8 invariant / scenario S6).
    async fn create_book(&mut self, venue: &str, symbol: &str) -> Result<mpsc::Sender<BookCommand>, ApiError> {
        if !is_valid_name(venue) || !is_valid_name(symbol) {
            return Err(ApiError::BadBookName);
        }
        if self.book_count >= self.max_books {
            return Err(ApiError::TooManyBooks);
        }

        let (adapter, stderr) = EngineAdapter::spawn(&self.engine_path, venue, symbol)
            .map_err(|e| {
                warn!(venue, symbol, error = %e, "failed to spawn matching engine");
                ApiError::EngineProtocolError
            })?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let actor = BookActor::new(adapter, rx);
        tokio::spawn(actor.run());

        let fan_out = EventFanOut::new(venue.to_owned(), symbol.to_owned(), stderr, Arc::clone(&self.subscribers));
        tokio::spawn(fan_out.run());

        self.books.entry(venue.to_owned()).or_default().insert(symbol.to_owned(), tx.clone());
        self.book_count += 1;
        METRICS.record_book_created();
        info!(venue, symbol, count = self.book_count, "book created");

        if self
            .view_tx
            .send(ViewMessage::BookCreated { venue: venue.to_owned(), symbol: symbol.to_owned() })
            .await
            .is_err()
        {
            warn!("hub view unreachable, book creation notification dropped");
        }

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_venue_before_symbol_check() {
        let config = HubConfig { max_books: 2, ..HubConfig::default() };
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());

        let result = handle
            .send_book_command("NOPE", "AAA", BookPayload::Raw("QUOTE".to_owned()), false)
            .await;
        assert_eq!(result, Err(ApiError::UnknownVenue));
    }

    #[tokio::test]
    async fn bad_name_takes_precedence_over_capacity() {
        let config = HubConfig { max_books: 0, ..HubConfig::default() };
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());

        let result = handle
            .send_book_command("!!!", "AAA", BookPayload::Raw("QUOTE".to_owned()), true)
            .await;
        assert_eq!(result, Err(ApiError::BadBookName));
    }

    #[tokio::test]
    async fn capacity_error_when_cap_reached_for_a_valid_name() {
        let config = HubConfig { max_books: 0, ..HubConfig::default() };
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());

        let result = handle
            .send_book_command("TESTEX", "AAA", BookPayload::Raw("QUOTE".to_owned()), true)
            .await;
        assert_eq!(result, Err(ApiError::TooManyBooks));
    }

    #[tokio::test]
    async fn venues_list_is_empty_before_any_creation() {
        let config = HubConfig::default();
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());

        let reply = handle.query(HubQuery::VenuesList).await.unwrap();
        let crate::command::EngineReply::Json(bytes) = reply else { panic!("expected json reply") };
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["venues"], serde_json::json!([]));
    }
}
