//! Every handler error path collapses to this type, which always renders as
//! HTTP 200 with `{"ok": false, "error": "..."}` (spec.md §7).

use axum::response::{IntoResponse, Json, Response};
use engine::ApiError;

pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        Json(self.0.to_envelope_json()).into_response()
    }
}
