//! Bootstraps the application (SPEC_FULL.md §4.3): eagerly creates the
//! configured default book before the HTTP listener binds, then hands the
//! router to the ambient-stack `Server`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use engine::{BookPayload, HubHandle};
use tokio_util::sync::CancellationToken;
use tools::http::{Server, ServerProcess};
use tracing::info;

use crate::{router, state::AppState};

/// Sends a throwaway `QUOTE` command for the configured default
/// `(venue, symbol)`, forcing the hub to create that book before the HTTP
/// listener accepts connections (`original_source/disorderBook_front.go`
/// `main()`; see SPEC_FULL.md §4.3).
struct EagerDefaultBook {
    hub: HubHandle,
    venue: String,
    symbol: String,
}

#[async_trait]
impl ServerProcess for EagerDefaultBook {
    async fn pre_run(&self) -> Result<()> {
        self.hub
            .send_book_command(&self.venue, &self.symbol, BookPayload::Raw("QUOTE".to_owned()), true)
            .await
            .map_err(|e| anyhow::anyhow!("failed to eagerly create default book: {e}"))?;
        info!(venue = %self.venue, symbol = %self.symbol, "default book created at startup");
        Ok(())
    }

    async fn run(&self, token: CancellationToken) -> Result<()> {
        token.cancelled().await;
        Ok(())
    }
}

/// Runs the HTTP + metrics listeners to completion (returns on graceful
/// shutdown).
pub async fn run(
    app_addr: String,
    metrics_addr: String,
    state: AppState,
    default_venue: String,
    default_symbol: String,
) -> Result<()> {
    let router = router::build(state.clone());
    let eager = Arc::new(EagerDefaultBook { hub: state.hub, venue: default_venue, symbol: default_symbol });

    Server::new(app_addr, metrics_addr)
        .with_router(router)
        .with_processes(vec![eager])
        .run()
        .await
}
