use thiserror::Error;

/// Every error kind the hub/router can produce, carrying exactly the human
/// message spec'd for the JSON error envelope `{"ok": false, "error": "..."}`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unknown path")]
    UnknownPath,

    #[error("Unknown venue")]
    UnknownVenue,

    #[error("Venue is known but symbol is not")]
    UnknownSymbol,

    #[error("Failed to parse incoming JSON")]
    BadJson,

    #[error("Venue or symbol in URL did not match that in POST")]
    UrlMismatch,

    #[error("Missing key or unacceptable value in POST")]
    MissingField,

    #[error("Unknown order ID")]
    UnknownOrder,

    #[error("Couldn't parse order ID")]
    BadOrderId,

    #[error("Unknown account or wrong API key")]
    AuthFailure,

    #[error("Venue not up (create it by using it)")]
    VenueNotUp,

    #[error("Couldn't create book! Bad name for a book!")]
    BadBookName,

    #[error("Couldn't create book! Too many books!")]
    TooManyBooks,

    #[error("Not implemented")]
    NotImplemented,

    #[error("Disabled or not enabled. (See command line options)")]
    Disabled,

    #[error("Bad account name (should be alpha_numeric and sane length)")]
    BadAccountName,

    #[error("Bad direction (should be buy or sell, lowercase)")]
    BadDirection,

    #[error("Bad (unknown) orderType")]
    BadOrderType,

    #[error("Bad (negative) price")]
    BadPrice,

    #[error("Bad (non-positive) qty")]
    BadQty,

    #[error("Hub received unknown hub command")]
    UnknownHubCommand,

    /// A book's matching-engine process died or failed the pipe protocol
    /// (missing `END` terminator, closed stdout, etc). See SPEC_FULL.md §9,
    /// open question 1: the book is marked dead and this error is returned
    /// for every subsequent command.
    #[error("Engine process error")]
    EngineProtocolError,
}

impl ApiError {
    /// Renders the `{"ok": false, "error": "..."}` envelope used by every
    /// non-success response. Kept here (rather than only in the `http`
    /// crate) so engine-internal callers can construct the same bytes the
    /// hub would have produced for a book's textual responses.
    #[must_use]
    pub fn to_envelope_json(&self) -> serde_json::Value {
        serde_json::json!({ "ok": false, "error": self.to_string() })
    }
}
