//! Error types for the fetch, persist and record steps.
//!
//! Each blocking step reports its own enum so callers can tell which failure
//! domain a request died in. None of these errors are retried.
use std::io;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure while fetching a quote over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No complete response arrived before the deadline.
    #[error("Timed out after {0:?} waiting for quote")]
    Timeout(Duration),

    /// Connection, TLS or body transfer failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("HTTP error: {0}")]
    UpstreamStatus(StatusCode),

    /// The body was not JSON of the expected shape, or a field was empty.
    #[error("Failed to decode quote: {0}")]
    Decode(String),
}

/// Failure while persisting a quote.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A store step did not finish before the deadline.
    #[error("Timed out after {0:?} writing quote")]
    Timeout(Duration),

    /// The backend could not be opened.
    #[error("Failed to open database: {0}")]
    Connection(#[source] sqlx::Error),

    /// The conditional table creation failed.
    #[error("Failed to create schema: {0}")]
    Schema(#[source] sqlx::Error),

    /// The row could not be written.
    #[error("Failed to insert quote: {0}")]
    Insert(#[source] sqlx::Error),

    /// Reading stored quotes back failed.
    #[error("Failed to read quotes: {0}")]
    Query(#[source] sqlx::Error),
}

/// Failure during one client run.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Opening or writing the output file failed.
    #[error("File error: {0}")]
    File(#[from] io::Error),
}
