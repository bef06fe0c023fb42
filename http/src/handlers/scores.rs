use axum::extract::{Path, State};
use axum::response::Response;
use engine::BookPayload;

use crate::{error::ApiErrorResponse, response::engine_reply_to_response, state::AppState};

/// `GET /ob/api/venues/:v/stocks/:s/scores`: HTML leaderboard, served as
/// `text/html` (spec.md §6.2). Does not create the book.
pub async fn scores(
    State(state): State<AppState>,
    Path((venue, symbol)): Path<(String, String)>,
) -> Result<Response, ApiErrorResponse> {
    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw("__SCORES__".to_owned()), false)
        .await?;
    Ok(engine_reply_to_response(reply))
}
