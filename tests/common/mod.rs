//! Shared utilities for integration tests.

use resource_engine::config::ServiceConfig;
use resource_engine::{HttpServer, ResourceStore, Shutdown};
use tokio::net::TcpListener;

/// A server bound to an ephemeral port; stops when dropped.
pub struct TestServer {
    pub base_url: String,
    pub store: ResourceStore,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Configuration suited to tests: no metrics exporter, trace headers on.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.observability.metrics_enabled = false;
    config.observability.decision_trace = true;
    config
}

/// Start the server with `config` on 127.0.0.1:0.
pub async fn spawn_server(config: ServiceConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = ResourceStore::new(config.store.id_strategy);
    let server = HttpServer::new(config, store.clone()).unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        store,
        shutdown,
    }
}

/// HTTP client that never goes through a proxy and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
