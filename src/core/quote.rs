//! Currency pair quote and its wire format

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a currency pair as reported by the quote API.
///
/// Values stay textual, exactly as the upstream sends them. Field names on the
/// wire follow the upstream convention (`varBid`, `pctChange`, `create_date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    #[sqlx(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    #[sqlx(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

impl Quote {
    /// Returns the wire name of the first empty field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("code", &self.code),
            ("codein", &self.codein),
            ("name", &self.name),
            ("high", &self.high),
            ("low", &self.low),
            ("varBid", &self.var_bid),
            ("pctChange", &self.pct_change),
            ("bid", &self.bid),
            ("ask", &self.ask),
            ("timestamp", &self.timestamp),
            ("create_date", &self.create_date),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    /// Moment the quote was observed, from the unix `timestamp` field.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}
