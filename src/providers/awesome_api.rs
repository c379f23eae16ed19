use crate::core::{FetchError, Quote, QuoteFetcher};
use crate::providers::util::{get_json, http_client};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Upstream response shape: the pair record keyed by its currency code.
#[derive(Deserialize, Debug)]
pub struct UpstreamEnvelope {
    #[serde(rename = "USDBRL")]
    usd_brl: Quote,
}

impl UpstreamEnvelope {
    /// Unwraps the pair record, rejecting records with empty fields.
    pub fn into_quote(self) -> Result<Quote, FetchError> {
        let quote = self.usd_brl;
        if let Some(field) = quote.missing_field() {
            return Err(FetchError::Decode(format!(
                "empty field `{field}` in upstream quote"
            )));
        }
        Ok(quote)
    }
}

// AwesomeApiFetcher implementation for QuoteFetcher
pub struct AwesomeApiFetcher {
    url: String,
    client: reqwest::Client,
}

impl AwesomeApiFetcher {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Ok(AwesomeApiFetcher {
            url: url.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl QuoteFetcher for AwesomeApiFetcher {
    #[instrument(name = "UpstreamQuoteFetch", skip(self))]
    async fn fetch(&self, deadline: Duration) -> Result<Quote, FetchError> {
        debug!("Requesting USD-BRL quote from {}", self.url);
        let envelope: UpstreamEnvelope = get_json(&self.client, &self.url, deadline).await?;
        envelope.into_quote()
    }
}
