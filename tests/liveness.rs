use std::sync::Arc;

use async_trait::async_trait;
use log_pusher::app::{App, StartupError};
use log_pusher::config::AppConfig;
use log_pusher::env::{INTERVAL_SECS_ENV, PORT_ENV, STORE_URI_ENV, WRITE_TIMEOUT_SECS_ENV};
use log_pusher::http::LIVENESS_BODY;
use log_pusher::memory_store::MemoryStore;
use log_pusher::record::LogRecord;
use log_pusher::store::{DocumentStore, StoreError};
use tokio::sync::{oneshot, Notify};
use tokio::time::{timeout, Duration, Instant};

/// Store whose writes hang for a fixed time and then fail.
struct HangingStore {
    entered: Notify,
    hang: Duration,
}

#[async_trait]
impl DocumentStore for HangingStore {
    async fn insert_many(&self, _records: &[LogRecord]) -> Result<usize, StoreError> {
        self.entered.notify_one();
        tokio::time::sleep(self.hang).await;
        Err(StoreError::Insert("gave up after hanging".into()))
    }

    fn describe(&self) -> String {
        "hanging".into()
    }
}

fn config(store_uri: &str, port: &str) -> AppConfig {
    let store_uri = store_uri.to_string();
    let port = port.to_string();
    AppConfig::from_lookup(move |key| match key {
        STORE_URI_ENV => Some(store_uri.clone()),
        PORT_ENV => Some(port.clone()),
        INTERVAL_SECS_ENV => Some("60".into()),
        WRITE_TIMEOUT_SECS_ENV => Some("30".into()),
        _ => None,
    })
    .unwrap()
}

async fn get_root(addr: std::net::SocketAddr) -> (u16, String) {
    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn liveness_answers_while_a_write_hangs() {
    let store = Arc::new(HangingStore {
        entered: Notify::new(),
        hang: Duration::from_secs(5),
    });
    let app = App::start_with_store(config("memory://", "0"), store.clone())
        .await
        .unwrap();
    let addr = app.local_addr().unwrap();
    let stats = app.write_stats();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.serve(async {
        let _ = stop_rx.await;
    }));

    // The first tick fires immediately and is now stuck in the store.
    timeout(Duration::from_secs(2), store.entered.notified())
        .await
        .expect("first tick never reached the store");

    let started = Instant::now();
    let (status, body) = timeout(Duration::from_secs(1), get_root(addr))
        .await
        .expect("liveness blocked by the in-flight write");
    assert_eq!(status, 200);
    assert_eq!(body, LIVENESS_BODY);
    assert!(started.elapsed() < Duration::from_secs(1));

    // The write is still in flight.
    assert_eq!(stats.snapshot().await.attempts, 1);
    assert_eq!(stats.snapshot().await.failures, 0);

    let _ = stop_tx.send(());
    server.abort();
}

struct Refusing;

#[async_trait]
impl DocumentStore for Refusing {
    async fn insert_many(&self, _records: &[LogRecord]) -> Result<usize, StoreError> {
        Err(StoreError::Connect("connection refused".into()))
    }

    fn describe(&self) -> String {
        "refusing".into()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn liveness_reports_ok_after_failed_ticks() {
    let app = App::start_with_store(config("memory://", "0"), Arc::new(Refusing))
        .await
        .unwrap();
    let addr = app.local_addr().unwrap();
    let stats = app.write_stats();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.serve(async {
        let _ = stop_rx.await;
    }));

    let deadline = Instant::now() + Duration::from_secs(2);
    while stats.snapshot().await.failures == 0 {
        assert!(Instant::now() < deadline, "first tick never failed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (status, body) = get_root(addr).await;
    assert_eq!(status, 200);
    assert_eq!(body, LIVENESS_BODY);

    let _ = stop_tx.send(());
    server.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn memory_store_app_writes_on_startup() {
    let app = App::start(config("memory://", "0")).await.unwrap();
    let stats = app.write_stats();

    let deadline = Instant::now() + Duration::from_secs(2);
    while stats.snapshot().await.successes == 0 {
        assert!(Instant::now() < deadline, "first tick never succeeded");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stats.snapshot().await.documents_written, 2);
    assert_eq!(app.store().describe(), "memory");

    app.serve(async {}).await.unwrap();
}

#[tokio::test]
async fn bind_conflict_is_a_startup_error() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    let result =
        App::start_with_store(config("memory://", &port), Arc::new(MemoryStore::new())).await;
    assert!(matches!(result, Err(StartupError::Bind { .. })));
}

#[cfg(feature = "opensearch")]
#[tokio::test]
async fn unreachable_store_is_a_startup_error() {
    // Nothing listens on port 1.
    let result = App::start(config("opensearch://127.0.0.1:1/logs", "0")).await;
    assert!(matches!(result, Err(StartupError::Store(StoreError::Connect(_)))));
}
