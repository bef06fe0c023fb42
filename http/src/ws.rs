//! WebSocket Handler (spec.md §4.7): upgrades, classifies into one of four
//! subscription shapes, registers a subscriber, and pumps messages from its
//! queue to the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use engine::runtime::metrics::METRICS;
use engine::subscriber::{Subscriber, SubscriberKind};
use futures_util::{SinkExt, StreamExt};
use tracing::info;

use crate::state::AppState;

pub async fn tickertape(
    State(state): State<AppState>,
    Path((account, venue)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state, SubscriberKind::Ticker, account, venue, None))
}

pub async fn tickertape_stock(
    State(state): State<AppState>,
    Path((account, venue, symbol)): Path<(String, String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state, SubscriberKind::Ticker, account, venue, Some(symbol)))
}

pub async fn executions(
    State(state): State<AppState>,
    Path((account, venue)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state, SubscriberKind::Execution, account, venue, None))
}

pub async fn executions_stock(
    State(state): State<AppState>,
    Path((account, venue, symbol)): Path<(String, String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state, SubscriberKind::Execution, account, venue, Some(symbol)))
}

/// Drives one subscriber's lifetime: registers it, pumps its outbound queue
/// to the socket, and runs a drain reader discarding incoming frames
/// (required by the protocol even though nothing is ever read back).
async fn run(
    socket: WebSocket,
    state: AppState,
    kind: SubscriberKind,
    account: String,
    venue: String,
    symbol: Option<String>,
) {
    let account_filter = match kind {
        SubscriberKind::Execution => Some(account.clone()),
        SubscriberKind::Ticker => None,
    };
    let (subscriber, mut outbound) = Subscriber::new(kind, venue.clone(), symbol.clone(), account_filter);
    state.hub.subscribers.insert(Arc::clone(&subscriber));
    METRICS.record_subscriber_connected();
    info!(%account, %venue, ?symbol, ?kind, "WebSocket subscriber connected");

    let (mut sink, mut stream) = socket.split();

    let mut drain = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            if message.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(payload) = frame else { break };
                let text = String::from_utf8_lossy(&payload).into_owned();
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            result = &mut drain => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "drain reader task panicked");
                }
                break;
            }
        }
    }

    drain.abort();
    state.hub.subscribers.remove(&subscriber);
    METRICS.record_subscriber_disconnected();
    info!(%account, %venue, "WebSocket subscriber disconnected");
}
