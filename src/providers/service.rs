use crate::core::{FetchError, Quote, QuoteFetcher};
use crate::providers::util::{get_json, http_client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches the flat quote record served by `GET /cotacao`.
pub struct ServiceFetcher {
    url: String,
    client: reqwest::Client,
}

impl ServiceFetcher {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Ok(ServiceFetcher {
            url: url.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl QuoteFetcher for ServiceFetcher {
    #[instrument(name = "ServiceQuoteFetch", skip(self))]
    async fn fetch(&self, deadline: Duration) -> Result<Quote, FetchError> {
        debug!("Requesting quote from service at {}", self.url);
        let quote: Quote = get_json(&self.client, &self.url, deadline).await?;
        if let Some(field) = quote.missing_field() {
            return Err(FetchError::Decode(format!(
                "empty field `{field}` in service response"
            )));
        }
        Ok(quote)
    }
}
