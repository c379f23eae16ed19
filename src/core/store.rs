//! Quote persistence abstraction

use crate::core::error::StoreError;
use crate::core::quote::Quote;
use async_trait::async_trait;
use std::time::Duration;

/// Append-only quote log.
///
/// Implementations ensure their schema exists on every call and write exactly
/// one record per successful `persist`. Each step of a call is bounded by
/// `deadline` on its own.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn persist(&self, quote: &Quote, deadline: Duration) -> Result<(), StoreError>;
}
