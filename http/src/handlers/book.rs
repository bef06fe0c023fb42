use axum::extract::{Path, State};
use axum::response::Response;
use engine::BookPayload;

use crate::{error::ApiErrorResponse, response::engine_reply_to_response, state::AppState};

/// `GET /ob/api/venues/:v/stocks/:s` (spec.md §6.2): full order book,
/// binary-to-JSON transcoded. Creates the book if absent.
pub async fn order_book(
    State(state): State<AppState>,
    Path((venue, symbol)): Path<(String, String)>,
) -> Result<Response, ApiErrorResponse> {
    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::OrderBookBinary, true)
        .await?;
    Ok(engine_reply_to_response(reply))
}

/// `GET /ob/api/venues/:v/stocks/:s/quote`. Creates the book if absent.
pub async fn quote(
    State(state): State<AppState>,
    Path((venue, symbol)): Path<(String, String)>,
) -> Result<Response, ApiErrorResponse> {
    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw("QUOTE".to_owned()), true)
        .await?;
    Ok(engine_reply_to_response(reply))
}
