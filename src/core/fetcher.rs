//! Quote fetching abstraction

use crate::core::error::FetchError;
use crate::core::quote::Quote;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Issues a single request and waits at most `deadline` for a complete quote.
    async fn fetch(&self, deadline: Duration) -> Result<Quote, FetchError>;
}
