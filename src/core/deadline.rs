//! Fixed deadlines for every blocking step

use std::time::Duration;

/// Client → service, covering the whole request.
pub const CLIENT_DEADLINE: Duration = Duration::from_millis(300);

/// Service → upstream quote API.
pub const FETCH_DEADLINE: Duration = Duration::from_millis(200);

/// Service → database, applied to each store step.
pub const PERSIST_DEADLINE: Duration = Duration::from_millis(10);

/// Deadlines used by the quote service for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub fetch: Duration,
    pub persist: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Deadlines {
            fetch: FETCH_DEADLINE,
            persist: PERSIST_DEADLINE,
        }
    }
}
