pub mod awesome_api;
pub mod service;
pub mod util;

// Re-export fetchers for cleaner imports
pub use awesome_api::AwesomeApiFetcher;
pub use service::ServiceFetcher;
