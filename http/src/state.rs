use std::sync::Arc;

use engine::{AuthTable, HubHandle};

/// Shared state handed to every axum handler (spec.md §4.6/§4.7).
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub auth: Arc<AuthTable>,
    pub excess: bool,
}

impl AppState {
    #[must_use]
    pub fn new(hub: HubHandle, auth: AuthTable, excess: bool) -> Self {
        Self { hub, auth: Arc::new(auth), excess }
    }
}
