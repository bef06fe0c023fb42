use tokio::sync::oneshot;

use crate::{book::BookKey, error::ApiError, orderbook::OrderBookSnapshot};

/// What a book actor (or the hub, for hub-only queries) hands back to the
/// caller through the reply channel. Distinct from a bare `Vec<u8>` because
/// the binary order-book command's reply is a structured snapshot, not
/// opaque text, while every other command's reply is the engine's raw
/// textual response body.
#[derive(Debug, Clone)]
pub enum EngineReply {
    /// Raw response bytes, already valid JSON text as produced by the
    /// matching engine or synthesized by the hub (venue list, heartbeat,
    /// stock list).
    Json(Vec<u8>),
    /// Raw HTML bytes (`__SCORES__`).
    Html(Vec<u8>),
    /// The decoded binary order book (`ORDERBOOK_BINARY`).
    OrderBook(OrderBookSnapshot),
}

pub type Reply = oneshot::Sender<Result<EngineReply, ApiError>>;

/// The payload sent to a book actor's inbox.
#[derive(Debug)]
pub enum BookPayload {
    /// A line of text to write to the engine's request stream (the actor
    /// appends a trailing newline if missing, per spec.md §4.2 step 1).
    Raw(String),
    /// The one binary-response command (spec.md §4.1).
    OrderBookBinary,
}

impl BookPayload {
    /// The literal line written to the engine's stdin.
    #[must_use]
    pub fn wire_command(&self) -> &str {
        match self {
            BookPayload::Raw(s) => s,
            BookPayload::OrderBookBinary => "ORDERBOOK_BINARY",
        }
    }
}

/// A single request routed to a specific book (spec.md §3 "Command").
#[derive(Debug)]
pub struct BookCommand {
    pub key: BookKey,
    pub payload: BookPayload,
    pub create_if_missing: bool,
    pub reply: Reply,
}

/// Global queries answered by the hub's read-model without touching any
/// book (spec.md §4.3 "Hub query").
#[derive(Debug, Clone)]
pub enum HubQuery {
    VenuesList,
    VenueHeartbeat { venue: String },
    StockList { venue: String },
}

/// Everything that arrives on the hub's single inbox (spec.md §4.3, §5 "all
/// Hub inputs arrive via one channel").
#[derive(Debug)]
pub enum HubRequest {
    Book(BookCommand),
    Query { query: HubQuery, reply: Reply },
}
