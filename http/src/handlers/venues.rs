use axum::extract::{Path, State};
use axum::response::Response;
use engine::HubQuery;

use crate::{error::ApiErrorResponse, response::engine_reply_to_response, state::AppState};

/// `GET /ob/api/venues` (spec.md §6.2).
pub async fn list_venues(State(state): State<AppState>) -> Result<Response, ApiErrorResponse> {
    let reply = state.hub.query(HubQuery::VenuesList).await?;
    Ok(engine_reply_to_response(reply))
}

/// `GET /ob/api/venues/:v/heartbeat`.
pub async fn venue_heartbeat(
    State(state): State<AppState>,
    Path(venue): Path<String>,
) -> Result<Response, ApiErrorResponse> {
    let reply = state.hub.query(HubQuery::VenueHeartbeat { venue }).await?;
    Ok(engine_reply_to_response(reply))
}

/// `GET /ob/api/venues/:v/stocks` (also reachable as `GET /ob/api/venues/:v`).
pub async fn stock_list(
    State(state): State<AppState>,
    Path(venue): Path<String>,
) -> Result<Response, ApiErrorResponse> {
    let reply = state.hub.query(HubQuery::StockList { venue }).await?;
    Ok(engine_reply_to_response(reply))
}
