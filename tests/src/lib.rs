//! Helpers that run bookinfo routers on loopback sockets for the integration tests.

use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;

use axum::Router;
use bookinfo::config::Config;
use bookinfo::Components;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

static INIT_TRACING: Once = Once::new();

/// Stdout logs for the test run, filtered by `RUST_LOG`.
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A router listening on `127.0.0.1`, stopped when dropped.
pub struct TestServer {
    pub url: String,
    shutdown: CancellationToken,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Resolves a configuration from `vars` only, never from the process environment.
pub fn config(vars: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.entry("HOSTNAME".to_string())
        .or_insert_with(|| "integration".to_string());
    Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test configuration")
}

pub async fn serve(app: Router) -> TestServer {
    serve_until(app, CancellationToken::new()).await
}

async fn serve_until(app: Router, shutdown: CancellationToken) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind a loopback port");
    let addr = listener.local_addr().expect("local address");

    let stop = shutdown.clone().cancelled_owned();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
            tracing::error!(error = %e, "Test server failed");
        }
    });

    TestServer {
        url: format!("http://{addr}"),
        shutdown,
    }
}

/// Starts a bookinfo process equivalent configured by `vars`.
pub async fn start_bookinfo(vars: &[(&str, &str)]) -> TestServer {
    init_test_tracing();
    let config = config(vars);
    let shutdown = CancellationToken::new();
    let components = Components::from_config(&config, &shutdown)
        .await
        .expect("components from test configuration");
    serve_until(bookinfo::router(config.role, &components), shutdown).await
}

/// Polls `url` until it answers with `status`, for state flipped by background tasks.
pub async fn wait_for_status(http: &reqwest::Client, url: &str, status: reqwest::StatusCode) {
    for _ in 0..50 {
        if let Ok(response) = http.get(url).send().await {
            if response.status() == status {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{url} never answered {status}");
}
