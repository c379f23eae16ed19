//! Quote service: `GET /cotacao` fetches, persists and returns one quote.
//!
//! Each request runs fetch, persist and respond in that order. A failed fetch
//! skips persistence; a failed persist discards the fetched quote. Both end in
//! a 500 with a generic body while the detail goes to the log.

use crate::core::deadline::Deadlines;
use crate::core::{FetchError, Quote, QuoteFetcher, QuoteStore, StoreError};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

pub const QUOTE_PATH: &str = "/cotacao";

/// Terminal failure of one request.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Persist failed: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match self {
            ServiceError::Fetch(_) => "failed to fetch quote",
            ServiceError::Store(_) => "failed to persist quote",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub struct QuoteService {
    fetcher: Arc<dyn QuoteFetcher>,
    store: Arc<dyn QuoteStore>,
    deadlines: Deadlines,
}

impl QuoteService {
    pub fn new(fetcher: Arc<dyn QuoteFetcher>, store: Arc<dyn QuoteStore>) -> Self {
        Self::with_deadlines(fetcher, store, Deadlines::default())
    }

    pub fn with_deadlines(
        fetcher: Arc<dyn QuoteFetcher>,
        store: Arc<dyn QuoteStore>,
        deadlines: Deadlines,
    ) -> Self {
        QuoteService {
            fetcher,
            store,
            deadlines,
        }
    }

    /// Runs one fetch-then-persist cycle.
    ///
    /// Each step gets its own deadline, started when that step starts.
    #[instrument(name = "QuoteRequest", skip(self))]
    pub async fn handle(&self) -> Result<Quote, ServiceError> {
        let quote = self
            .fetcher
            .fetch(self.deadlines.fetch)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch quote"))?;
        info!(
            bid = %quote.bid,
            observed_at = ?quote.observed_at(),
            "Fetched USD-BRL quote"
        );

        self.store
            .persist(&quote, self.deadlines.persist)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to persist quote"))?;

        Ok(quote)
    }
}

async fn get_quote(State(service): State<Arc<QuoteService>>) -> Result<Json<Quote>, ServiceError> {
    service.handle().await.map(Json)
}

/// Builds the router exposing the quote endpoint.
pub fn router(service: Arc<QuoteService>) -> Router {
    Router::new()
        .route(QUOTE_PATH, get(get_quote))
        .with_state(service)
}

/// Serves `app` on `listener` until Ctrl+C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!(
        "Quote service listening on {}",
        listener.local_addr().context("Listener has no local address")?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Quote service stopped unexpectedly")?;
    info!("Quote service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
