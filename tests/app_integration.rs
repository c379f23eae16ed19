use async_trait::async_trait;
use cotacao::core::deadline::{CLIENT_DEADLINE, Deadlines};
use cotacao::core::{Quote, QuoteStore, StoreError};
use cotacao::providers::{AwesomeApiFetcher, ServiceFetcher};
use cotacao::server::{QuoteService, router};
use cotacao::store::{MemoryQuoteStore, SqliteQuoteStore};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub const UPSTREAM_PATH: &str = "/json/last/USD-BRL";

    pub fn upstream_body(bid: &str) -> String {
        format!(
            r#"{{
                "USDBRL": {{
                    "code": "USD",
                    "codein": "BRL",
                    "name": "Dólar Americano/Real Brasileiro",
                    "high": "5.0272",
                    "low": "4.9838",
                    "varBid": "0.0057",
                    "pctChange": "0.11",
                    "bid": "{bid}",
                    "ask": "5.0161",
                    "timestamp": "1718913600",
                    "create_date": "2024-06-20 17:00:00"
                }}
            }}"#
        )
    }

    pub async fn create_upstream_mock(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(UPSTREAM_PATH))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Mocks the quote service itself, for client-only tests.
    pub async fn create_service_mock(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cotacao"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Starts the real quote service on an ephemeral port and returns its
    /// `/cotacao` URL.
    pub async fn spawn_service(
        upstream: &MockServer,
        store: Arc<dyn QuoteStore>,
        deadlines: Deadlines,
    ) -> String {
        let fetcher =
            AwesomeApiFetcher::new(&format!("{}{}", upstream.uri(), UPSTREAM_PATH)).unwrap();
        let service = QuoteService::with_deadlines(Arc::new(fetcher), store, deadlines);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(service)))
                .await
                .unwrap();
        });

        format!("http://{addr}/cotacao")
    }

    /// A local URL with nothing listening behind it.
    pub fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/cotacao")
    }
}

struct FailingStore;

#[async_trait]
impl QuoteStore for FailingStore {
    async fn persist(&self, _quote: &Quote, _deadline: Duration) -> Result<(), StoreError> {
        Err(StoreError::Insert(sqlx::Error::PoolClosed))
    }
}

/// Store whose write never finishes within the deadline.
struct SlowStore;

#[async_trait]
impl QuoteStore for SlowStore {
    async fn persist(&self, _quote: &Quote, deadline: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(deadline, tokio::time::sleep(Duration::from_secs(5)))
            .await
            .map_err(|_| StoreError::Timeout(deadline))
    }
}

#[test_log::test(tokio::test)]
async fn test_response_matches_persisted_row() {
    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200).set_body_string(test_utils::upstream_body("5.0131")),
    )
    .await;
    let store = Arc::new(MemoryQuoteStore::new());
    let url = test_utils::spawn_service(&upstream, store.clone(), Deadlines::default()).await;

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    info!(?body, "Service response");
    // Flat pair object, not the upstream envelope
    assert!(body.get("USDBRL").is_none());
    assert_eq!(body["bid"], "5.0131");

    let served: Quote = serde_json::from_value(body).unwrap();
    assert_eq!(store.rows().await, vec![served]);
}

#[test_log::test(tokio::test)]
async fn test_upstream_timeout_skips_persistence() {
    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200)
            .set_body_string(test_utils::upstream_body("5.0131"))
            .set_delay(Duration::from_millis(600)),
    )
    .await;
    let store = Arc::new(MemoryQuoteStore::new());
    let url = test_utils::spawn_service(&upstream, store.clone(), Deadlines::default()).await;

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "failed to fetch quote");
    assert_eq!(store.persist_calls(), 0);
}

#[test_log::test(tokio::test)]
async fn test_upstream_error_status_returns_500() {
    let upstream = test_utils::create_upstream_mock(ResponseTemplate::new(429)).await;
    let store = Arc::new(MemoryQuoteStore::new());
    let url = test_utils::spawn_service(&upstream, store.clone(), Deadlines::default()).await;

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(store.persist_calls(), 0);
}

#[test_log::test(tokio::test)]
async fn test_store_failure_does_not_leak_quote() {
    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200).set_body_string(test_utils::upstream_body("5.0131")),
    )
    .await;

    for store in [
        Arc::new(FailingStore) as Arc<dyn QuoteStore>,
        Arc::new(SlowStore) as Arc<dyn QuoteStore>,
    ] {
        let url = test_utils::spawn_service(&upstream, store, Deadlines::default()).await;

        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 500);
        let body = response.text().await.unwrap();
        assert_eq!(body, "failed to persist quote");
        assert!(!body.contains("5.0131"));
    }
}

#[test_log::test(tokio::test)]
async fn test_concurrent_requests_are_independent() {
    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200).set_body_string(test_utils::upstream_body("5.0131")),
    )
    .await;
    let store = Arc::new(MemoryQuoteStore::new());
    let url = test_utils::spawn_service(&upstream, store.clone(), Deadlines::default()).await;

    let client = reqwest::Client::new();
    let responses =
        futures::future::join_all((0..8).map(|_| client.get(&url).send())).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), 200);
    }
    assert_eq!(store.rows().await.len(), 8);
}

#[test_log::test(tokio::test)]
async fn test_end_to_end_with_sqlite_store() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cotacoes.db");
    let output = temp_dir.path().join("cotacao.txt");

    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200).set_body_string(test_utils::upstream_body("5.2233")),
    )
    .await;
    // Relaxed deadlines keep disk latency from making this flaky
    let deadlines = Deadlines {
        fetch: Duration::from_secs(2),
        persist: Duration::from_secs(2),
    };
    let url = test_utils::spawn_service(
        &upstream,
        Arc::new(SqliteQuoteStore::new(&db_path)),
        deadlines,
    )
    .await;

    let fetcher = ServiceFetcher::new(&url).unwrap();
    let quote = cotacao::client::record_once(&fetcher, &output, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 5.2233\n");

    let rows = SqliteQuoteStore::new(&db_path)
        .history(10, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(rows, vec![quote]);
}

#[test_log::test(tokio::test)]
async fn test_locked_sqlite_store_answers_500_promptly() {
    use sqlx::{ConnectOptions, Connection};

    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cotacoes.db");
    let store = SqliteQuoteStore::new(&db_path);
    // Create the table up front so the lock below covers a real write
    let seeded = serde_json::from_str::<serde_json::Value>(&test_utils::upstream_body("5.0000"))
        .unwrap();
    let seed: Quote = serde_json::from_value(seeded["USDBRL"].clone()).unwrap();
    store.persist(&seed, Duration::from_secs(2)).await.unwrap();

    let upstream = test_utils::create_upstream_mock(
        ResponseTemplate::new(200).set_body_string(test_utils::upstream_body("5.3344")),
    )
    .await;
    let url = test_utils::spawn_service(
        &upstream,
        Arc::new(SqliteQuoteStore::new(&db_path)),
        Deadlines::default(),
    )
    .await;

    let mut locker = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&db_path)
        .connect()
        .await
        .unwrap();
    sqlx::query("BEGIN EXCLUSIVE")
        .execute(&mut locker)
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let response = reqwest::get(&url).await.unwrap();
    let elapsed = started.elapsed();

    sqlx::query("ROLLBACK").execute(&mut locker).await.unwrap();
    locker.close().await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "failed to persist quote");
    // Fetch deadline plus one bounded store attempt, with slack for CI
    assert!(
        elapsed < Duration::from_secs(1),
        "service held the request for {elapsed:?}"
    );

    let rows = store.history(10, Duration::from_secs(2)).await.unwrap();
    assert_eq!(rows, vec![seed]);
}

#[test_log::test(tokio::test)]
async fn test_client_appends_one_line_per_run() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = temp_dir.path().join("cotacao.txt");

    let service = test_utils::create_service_mock(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({
            "code": "USD",
            "codein": "BRL",
            "name": "Dólar Americano/Real Brasileiro",
            "high": "5.10",
            "low": "4.90",
            "varBid": "0.01",
            "pctChange": "0.2",
            "bid": "5.00",
            "ask": "5.01",
            "timestamp": "1718913600",
            "create_date": "2024-06-20 17:00:00"
        }),
    ))
    .await;
    let fetcher = ServiceFetcher::new(&format!("{}/cotacao", service.uri())).unwrap();

    cotacao::client::run(&fetcher, &output, CLIENT_DEADLINE).await;
    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 5.00\n");

    cotacao::client::run(&fetcher, &output, CLIENT_DEADLINE).await;
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "Dólar: 5.00\nDólar: 5.00\n"
    );
}

#[test_log::test(tokio::test)]
async fn test_client_against_unreachable_service() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = temp_dir.path().join("cotacao.txt");

    let fetcher = ServiceFetcher::new(&test_utils::unreachable_url()).unwrap();
    cotacao::client::run(&fetcher, &output, CLIENT_DEADLINE).await;

    assert!(!output.exists());
}

#[test_log::test(tokio::test)]
async fn test_client_against_failing_service() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = temp_dir.path().join("cotacao.txt");

    let service = test_utils::create_service_mock(
        ResponseTemplate::new(500).set_body_string("failed to fetch quote"),
    )
    .await;
    let fetcher = ServiceFetcher::new(&format!("{}/cotacao", service.uri())).unwrap();
    cotacao::client::run(&fetcher, &output, CLIENT_DEADLINE).await;

    assert!(!output.exists());
}

#[test_log::test(tokio::test)]
async fn test_full_fetch_command_with_config() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = temp_dir.path().join("cotacao.txt");

    let service = test_utils::create_service_mock(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({
            "code": "USD",
            "codein": "BRL",
            "name": "Dólar Americano/Real Brasileiro",
            "high": "5.10",
            "low": "4.90",
            "varBid": "0.01",
            "pctChange": "0.2",
            "bid": "5.05",
            "ask": "5.06",
            "timestamp": "1718913600",
            "create_date": "2024-06-20 17:00:00"
        }),
    ))
    .await;

    let config_path = temp_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
        client:
          service_url: "{}/cotacao"
          output_path: "{}"
    "#,
        service.uri(),
        output.display()
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = cotacao::run_command(
        cotacao::AppCommand::Fetch,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Fetch command failed with: {:?}",
        result.err()
    );
    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 5.05\n");
}

#[test_log::test(tokio::test)]
async fn test_fetch_command_succeeds_when_service_is_down() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let output = temp_dir.path().join("cotacao.txt");

    let config_path = temp_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
        client:
          service_url: "{}"
          output_path: "{}"
    "#,
        test_utils::unreachable_url(),
        output.display()
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = cotacao::run_command(
        cotacao::AppCommand::Fetch,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok());
    assert!(!output.exists());
}

#[test_log::test(tokio::test)]
async fn test_history_command_on_fresh_database() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cotacoes.db");

    let config_path = temp_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
        server:
          database_path: "{}"
    "#,
        db_path.display()
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = cotacao::run_command(
        cotacao::AppCommand::History { limit: 5 },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "History failed with: {:?}", result.err());
}
