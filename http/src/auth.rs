//! Auth header extraction (spec.md §6.2): `X-Starfighter-Authorization`
//! preferred, `X-Stockfighter-Authorization` as a fallback.

use axum::http::HeaderMap;
use engine::{ApiError, AuthTable};

const PRIMARY_HEADER: &str = "X-Starfighter-Authorization";
const FALLBACK_HEADER: &str = "X-Stockfighter-Authorization";

#[must_use]
pub fn extract_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(PRIMARY_HEADER)
        .or_else(|| headers.get(FALLBACK_HEADER))
        .and_then(|value| value.to_str().ok())
}

/// Verifies `account` against the supplied headers. A missing account, a
/// missing header, or a key mismatch are all `AUTH_FAILURE` (spec.md §6.2);
/// auth is a no-op entirely when the auth table is disabled.
pub fn authenticate(auth: &AuthTable, headers: &HeaderMap, account: &str) -> Result<(), ApiError> {
    if !auth.is_enabled() {
        return Ok(());
    }
    match extract_key(headers) {
        Some(key) if auth.verify(account, key) => Ok(()),
        _ => Err(ApiError::AuthFailure),
    }
}
