use crate::core::{Quote, QuoteStore, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteQueryResult};
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cotacoes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL,
    codein TEXT NOT NULL,
    name TEXT NOT NULL,
    high TEXT NOT NULL,
    low TEXT NOT NULL,
    varBid TEXT NOT NULL,
    pctChange TEXT NOT NULL,
    bid TEXT NOT NULL,
    ask TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    create_date TEXT NOT NULL
);"#;

const INSERT_QUOTE: &str = r#"
INSERT INTO cotacoes
    (code, codein, name, high, low, varBid, pctChange, bid, ask, timestamp, create_date)
VALUES
    (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"#;

const SELECT_RECENT: &str = r#"
SELECT code, codein, name, high, low, varBid, pctChange, bid, ask, timestamp, create_date
FROM cotacoes
ORDER BY id DESC
LIMIT ?;"#;

/// Runs one store step, mapping an elapsed deadline to `StoreError::Timeout`.
async fn step<T, F>(
    deadline: Duration,
    fut: F,
    on_error: fn(sqlx::Error) -> StoreError,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(on_error),
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

/// SQLite backed quote log.
///
/// Holds only the database path: every call opens its own connection and
/// closes it before returning. SQLite's busy timeout is set to the step
/// deadline so a locked database fails the step instead of waiting.
pub struct SqliteQuoteStore {
    path: PathBuf,
}

impl SqliteQuoteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteQuoteStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self, deadline: Duration) -> Result<SqliteConnection, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(deadline);
        step(deadline, options.connect(), StoreError::Connection).await
    }

    async fn ensure_schema(
        conn: &mut SqliteConnection,
        deadline: Duration,
    ) -> Result<(), StoreError> {
        step(
            deadline,
            sqlx::query(CREATE_TABLE).execute(&mut *conn),
            StoreError::Schema,
        )
        .await?;
        Ok(())
    }

    /// Inserts `quote` inside its own transaction. A transaction left open
    /// by an elapsed step is rolled back when the connection goes away.
    async fn write(
        conn: &mut SqliteConnection,
        quote: &Quote,
        deadline: Duration,
    ) -> Result<SqliteQueryResult, StoreError> {
        Self::ensure_schema(conn, deadline).await?;

        let mut tx = step(deadline, conn.begin(), StoreError::Insert).await?;
        let inserted = step(
            deadline,
            sqlx::query(INSERT_QUOTE)
                .bind(&quote.code)
                .bind(&quote.codein)
                .bind(&quote.name)
                .bind(&quote.high)
                .bind(&quote.low)
                .bind(&quote.var_bid)
                .bind(&quote.pct_change)
                .bind(&quote.bid)
                .bind(&quote.ask)
                .bind(&quote.timestamp)
                .bind(&quote.create_date)
                .execute(&mut *tx),
            StoreError::Insert,
        )
        .await?;
        step(deadline, tx.commit(), StoreError::Insert).await?;

        Ok(inserted)
    }

    /// Shuts the connection down, giving up after `deadline`. An abandoned
    /// statement still queued on the worker must not hold the caller.
    async fn close(conn: SqliteConnection, deadline: Duration) {
        match tokio::time::timeout(deadline, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to close database connection"),
            Err(_) => warn!("Closing database connection exceeded {:?}", deadline),
        }
    }

    /// Returns up to `limit` stored quotes, newest first.
    pub async fn history(&self, limit: u32, deadline: Duration) -> Result<Vec<Quote>, StoreError> {
        let mut conn = self.open(deadline).await?;

        let rows = match Self::ensure_schema(&mut conn, deadline).await {
            Ok(()) => {
                step(
                    deadline,
                    sqlx::query_as::<_, Quote>(SELECT_RECENT)
                        .bind(i64::from(limit))
                        .fetch_all(&mut conn),
                    StoreError::Query,
                )
                .await
            }
            Err(e) => Err(e),
        };

        Self::close(conn, deadline).await;
        rows
    }
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    #[instrument(name = "SqlitePersist", skip(self, quote))]
    async fn persist(&self, quote: &Quote, deadline: Duration) -> Result<(), StoreError> {
        let mut conn = self.open(deadline).await?;
        let written = Self::write(&mut conn, quote, deadline).await;
        Self::close(conn, deadline).await;

        let result = written?;
        debug!(row_id = result.last_insert_rowid(), "Quote persisted");
        Ok(())
    }
}
