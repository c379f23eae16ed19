use crate::core::{Quote, QuoteStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory append-only quote log.
///
/// Counts every `persist` call, successful or not, so callers can assert on
/// how often the store was reached.
#[derive(Default)]
pub struct MemoryQuoteStore {
    rows: Mutex<Vec<Quote>>,
    calls: AtomicUsize,
}

impl MemoryQuoteStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored quotes in insertion order.
    pub async fn rows(&self) -> Vec<Quote> {
        self.rows.lock().await.clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn persist(&self, quote: &Quote, deadline: Duration) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut rows = tokio::time::timeout(deadline, self.rows.lock())
            .await
            .map_err(|_| StoreError::Timeout(deadline))?;
        rows.push(quote.clone());
        debug!(rows = rows.len(), "Quote appended to memory store");
        Ok(())
    }
}
