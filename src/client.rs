//! Quote client: ask the service for the current rate once and append it to a
//! local file.

use crate::core::{ClientError, Quote, QuoteFetcher};
use std::path::Path;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

/// Line appended to the output file for one quote.
pub fn format_line(quote: &Quote) -> String {
    format!("Dólar: {}\n", quote.bid)
}

/// Appends the quote line to `path`, creating the file if needed.
pub async fn append_quote(path: &Path, quote: &Quote) -> Result<(), ClientError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format_line(quote).as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Fetches one quote and records it.
///
/// The file is only opened once a quote is in hand, so a failed fetch leaves
/// it untouched.
pub async fn record_once(
    fetcher: &dyn QuoteFetcher,
    output: &Path,
    deadline: Duration,
) -> Result<Quote, ClientError> {
    let quote = fetcher.fetch(deadline).await?;
    append_quote(output, &quote).await?;
    Ok(quote)
}

/// Runs the client once, logging instead of returning failures.
pub async fn run(fetcher: &dyn QuoteFetcher, output: &Path, deadline: Duration) {
    match record_once(fetcher, output, deadline).await {
        Ok(quote) => info!(
            bid = %quote.bid,
            "Quote saved to {}",
            output.display()
        ),
        Err(ClientError::Fetch(e)) => error!(error = %e, "Failed to get quote from service"),
        Err(ClientError::File(e)) => error!(
            error = %e,
            "Failed to write quote to {}",
            output.display()
        ),
    }
}
