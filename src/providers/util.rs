use crate::core::FetchError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("cotacao/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the quote fetchers.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

async fn send_and_decode<T>(client: &reqwest::Client, url: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let response = client.get(url).send().await?;
    let status = response.status();
    debug!(%status, "Received response from {}", url);

    if status != StatusCode::OK {
        return Err(FetchError::UpstreamStatus(status));
    }

    let body = response.bytes().await?;
    serde_json::from_slice::<T>(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Issues one GET and decodes the JSON body, all within `deadline`.
///
/// # Parameters
/// - `client`: HTTP client used for the request
/// - `url`: Absolute URL to fetch
/// - `deadline`: Upper bound for the whole exchange, body included
///
/// # Returns
/// The decoded body, or the first failure. Any status other than 200 is
/// reported without reading the body. There is no retry.
pub async fn get_json<T>(
    client: &reqwest::Client,
    url: &str,
    deadline: Duration,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    match tokio::time::timeout(deadline, send_and_decode(client, url)).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Request to {} exceeded {:?}", url, deadline);
            Err(FetchError::Timeout(deadline))
        }
    }
}
