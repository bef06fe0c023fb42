//! Order placement, status, cancellation, and the excess-mode
//! account-orders listing (spec.md §4.6, §6.2).

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Json, body::Bytes};
use engine::{ApiError, BookPayload, book::is_valid_name};
use serde::Deserialize;

use crate::{auth, error::ApiErrorResponse, response::engine_reply_to_response, state::AppState};

#[derive(Debug, Deserialize)]
struct OrderRequest {
    account: Option<String>,
    venue: Option<String>,
    #[serde(alias = "stock")]
    symbol: Option<String>,
    qty: Option<i64>,
    price: Option<i64>,
    direction: Option<String>,
    #[serde(rename = "orderType")]
    order_type: Option<String>,
}

fn direction_code(direction: &str) -> Result<u8, ApiError> {
    match direction {
        "buy" => Ok(1),
        "sell" => Ok(2),
        _ => Err(ApiError::BadDirection),
    }
}

fn order_type_code(order_type: &str) -> Result<u8, ApiError> {
    match order_type {
        "limit" => Ok(1),
        "market" => Ok(2),
        "fok" | "fill-or-kill" => Ok(3),
        "ioc" | "immediate-or-cancel" => Ok(4),
        _ => Err(ApiError::BadOrderType),
    }
}

/// `POST /ob/api/venues/:v/stocks/:s/orders`. Validation runs in the exact
/// order spec.md §4.6 step 2 lists: JSON well-formedness, URL/body
/// consistency, required-field presence, price, qty, account name,
/// order-type, direction, authentication.
pub async fn create_order(
    State(state): State<AppState>,
    Path((venue, symbol)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiErrorResponse> {
    let request: OrderRequest = serde_json::from_slice(&body).map_err(|_| ApiError::BadJson)?;

    if request.venue.as_deref().is_some_and(|v| v != venue)
        || request.symbol.as_deref().is_some_and(|s| s != symbol)
    {
        return Err(ApiError::UrlMismatch.into());
    }

    let (Some(account), Some(qty), Some(price), Some(direction), Some(order_type)) = (
        request.account.as_deref(),
        request.qty,
        request.price,
        request.direction.as_deref(),
        request.order_type.as_deref(),
    ) else {
        return Err(ApiError::MissingField.into());
    };

    if price < 0 {
        return Err(ApiError::BadPrice.into());
    }
    if qty < 1 {
        return Err(ApiError::BadQty.into());
    }
    if !is_valid_name(account) {
        return Err(ApiError::BadAccountName.into());
    }
    let order_type_code = order_type_code(order_type)?;
    let direction_code = direction_code(direction)?;
    auth::authenticate(&state.auth, &headers, account)?;

    let acc_id = state.hub.accounts.lookup_or_insert(account);
    let command = format!("ORDER {account} {acc_id} {qty} {price} {direction_code} {order_type_code}");
    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw(command), true)
        .await?;
    Ok(engine_reply_to_response(reply))
}

/// Resolves the account owning `order_id` via the auxiliary
/// `__ACC_FROM_ID__` command (spec.md §4.6 cancel/status flow), then
/// authenticates against it.
async fn resolve_and_authenticate(
    state: &AppState,
    headers: &HeaderMap,
    venue: &str,
    symbol: &str,
    order_id: usize,
) -> Result<(), ApiError> {
    let reply = state
        .hub
        .send_book_command(venue, symbol, engine::hub::acc_from_id_command(order_id), false)
        .await?;
    let engine::EngineReply::Json(bytes) = reply else {
        return Err(ApiError::EngineProtocolError);
    };
    let text = String::from_utf8_lossy(&bytes);
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("ERROR") {
        return Err(ApiError::UnknownOrder);
    }
    let account = trimmed
        .split_whitespace()
        .next_back()
        .ok_or(ApiError::UnknownOrder)?;
    auth::authenticate(&state.auth, headers, account)
}

/// `GET /ob/api/venues/:v/stocks/:s/orders/:id`.
pub async fn order_status(
    State(state): State<AppState>,
    Path((venue, symbol, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    let order_id: usize = id.parse().map_err(|_| ApiError::BadOrderId)?;
    resolve_and_authenticate(&state, &headers, &venue, &symbol, order_id).await?;

    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw(format!("STATUS {order_id}")), false)
        .await?;
    Ok(engine_reply_to_response(reply))
}

/// `DELETE /ob/api/venues/:v/stocks/:s/orders/:id`.
pub async fn cancel_order(
    State(state): State<AppState>,
    Path((venue, symbol, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    let order_id: usize = id.parse().map_err(|_| ApiError::BadOrderId)?;
    resolve_and_authenticate(&state, &headers, &venue, &symbol, order_id).await?;

    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw(format!("CANCEL {order_id}")), false)
        .await?;
    Ok(engine_reply_to_response(reply))
}

/// `GET /ob/api/venues/:v/accounts/:a/stocks/:s/orders` (excess-mode only).
pub async fn account_stock_orders(
    State(state): State<AppState>,
    Path((venue, account, symbol)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    if !state.excess {
        return Err(ApiError::Disabled.into());
    }
    auth::authenticate(&state.auth, &headers, &account)?;
    let acc_id = state.hub.accounts.lookup_or_insert(&account);
    let reply = state
        .hub
        .send_book_command(&venue, &symbol, BookPayload::Raw(format!("STATUSALL {acc_id}")), false)
        .await?;
    Ok(engine_reply_to_response(reply))
}

/// `GET /ob/api/venues/:v/accounts/:a/orders`: always not implemented
/// (spec.md §6.2).
pub async fn account_all_orders() -> Result<Json<serde_json::Value>, ApiErrorResponse> {
    Err(ApiError::NotImplemented.into())
}
