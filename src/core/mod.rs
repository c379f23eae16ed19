//! Core business logic abstractions

pub mod config;
pub mod deadline;
pub mod error;
pub mod fetcher;
pub mod log;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{ClientError, FetchError, StoreError};
pub use fetcher::QuoteFetcher;
pub use quote::Quote;
pub use store::QuoteStore;
