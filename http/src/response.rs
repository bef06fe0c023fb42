//! Converts an [`engine::EngineReply`] into the axum response the spec calls
//! for: raw JSON bytes, raw HTML bytes (`__SCORES__`), or a JSON-encoded
//! order-book snapshot.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use engine::EngineReply;

pub fn engine_reply_to_response(reply: EngineReply) -> Response {
    match reply {
        EngineReply::Json(bytes) => json_bytes(bytes),
        EngineReply::Html(bytes) => html_bytes(bytes),
        EngineReply::OrderBook(snapshot) => {
            let bytes = serde_json::to_vec(&snapshot).expect("order book snapshot always serializes");
            json_bytes(bytes)
        }
    }
}

fn json_bytes(bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn html_bytes(bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    response
}

/// The root `/` welcome page: a minimal static HTML string (spec.md §1
/// "the front HTML page's content (a minimal static string is fine)").
pub fn welcome_page() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body><h1>disorderBook</h1><p>An unofficial Stockfighter-compatible exchange.</p></body></html>",
    )
}
