//! HTTP Router (spec.md §4.6): path-shape driven, no prefix trie. Every
//! route under `/ob/api/` is listed explicitly; anything else falls through
//! to the fallback handler, which renders `Unknown path`.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::error::ApiErrorResponse;
use crate::handlers::{book, heartbeat, orders, scores, venues};
use crate::response::welcome_page;
use crate::state::AppState;
use crate::ws;

pub fn build(state: AppState) -> Router {
    let api = Router::new()
        .route("/heartbeat", get(heartbeat::heartbeat))
        .route("/venues", get(venues::list_venues))
        .route("/venues/{venue}/heartbeat", get(venues::venue_heartbeat))
        .route("/venues/{venue}/stocks", get(venues::stock_list))
        .route("/venues/{venue}", get(venues::stock_list))
        .route("/venues/{venue}/stocks/{symbol}", get(book::order_book))
        .route("/venues/{venue}/stocks/{symbol}/quote", get(book::quote))
        .route("/venues/{venue}/stocks/{symbol}/orders", post(orders::create_order))
        .route(
            "/venues/{venue}/stocks/{symbol}/orders/{id}",
            get(orders::order_status).delete(orders::cancel_order),
        )
        .route(
            "/venues/{venue}/accounts/{account}/stocks/{symbol}/orders",
            get(orders::account_stock_orders),
        )
        .route("/venues/{venue}/accounts/{account}/orders", get(orders::account_all_orders))
        .route("/venues/{venue}/stocks/{symbol}/scores", get(scores::scores))
        .route("/ws/{account}/venues/{venue}/tickertape", get(ws::tickertape))
        .route(
            "/ws/{account}/venues/{venue}/tickertape/stocks/{symbol}",
            get(ws::tickertape_stock),
        )
        .route("/ws/{account}/venues/{venue}/executions", get(ws::executions))
        .route(
            "/ws/{account}/venues/{venue}/executions/stocks/{symbol}",
            get(ws::executions_stock),
        );

    Router::new()
        .route("/", get(welcome_page))
        .nest("/ob/api", api)
        .fallback(unknown_path)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false).level(tracing::Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}

async fn unknown_path() -> impl IntoResponse {
    ApiErrorResponse(engine::ApiError::UnknownPath)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use engine::{AuthTable, Hub, HubConfig};
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> AppState {
        let config = HubConfig { max_books: 2, ..HubConfig::default() };
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());
        AppState::new(handle, AuthTable::disabled(), false)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn s1_heartbeat() {
        let app = build(test_state());
        let response = app
            .oneshot(Request::get("/ob/api/heartbeat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value, serde_json::json!({ "ok": true, "error": "" }));
    }

    #[tokio::test]
    async fn s2_unknown_path() {
        let app = build(test_state());
        let response = app.oneshot(Request::get("/ob/api/nope").body(Body::empty()).unwrap()).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Unknown path");
    }

    #[tokio::test]
    async fn s5_order_validation_url_mismatch() {
        let app = build(test_state());
        let body = serde_json::json!({
            "account": "BOB",
            "venue": "OTHER",
            "symbol": "FOOBAR",
            "qty": 1,
            "price": 100,
            "direction": "buy",
            "orderType": "limit",
        });
        let request = Request::post("/ob/api/venues/TESTEX/stocks/FOOBAR/orders")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Venue or symbol in URL did not match that in POST");
    }

    #[tokio::test]
    async fn s6_bad_name_precedes_capacity() {
        let config = HubConfig { max_books: 0, ..HubConfig::default() };
        let (hub, view, handle) = Hub::new(&config);
        tokio::spawn(hub.run());
        tokio::spawn(view.run());
        let state = AppState::new(handle, AuthTable::disabled(), false);

        let app = build(state);
        let response =
            app.oneshot(Request::get("/ob/api/venues/!!!/stocks/AAA/quote").body(Body::empty()).unwrap()).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Couldn't create book! Bad name for a book!");
    }

    #[tokio::test]
    async fn account_all_orders_is_never_implemented() {
        let app = build(test_state());
        let response = app
            .oneshot(Request::get("/ob/api/venues/TESTEX/accounts/BOB/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let value = body_json(response).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Not implemented");
    }

    #[tokio::test]
    async fn excess_gated_endpoint_is_disabled_by_default() {
        let app = build(test_state());
        let response = app
            .oneshot(
                Request::get("/ob/api/venues/TESTEX/accounts/BOB/stocks/FOOBAR/orders").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(response).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Disabled or not enabled. (See command line options)");
    }
}
