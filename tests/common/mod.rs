//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use traefik_manager::config::ManagerConfig;
use traefik_manager::http::HttpServer;
use traefik_manager::lifecycle::Shutdown;
use traefik_manager::store::ResourceStore;

/// A manager listening on an ephemeral local port.
pub struct TestServer {
    /// `http://127.0.0.1:<port>`
    pub root: String,
    pub store: Arc<ResourceStore>,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
    handle: JoinHandle<std::io::Result<()>>,
    api_prefix: String,
}

impl TestServer {
    pub fn api(&self, path: &str) -> String {
        format!("{}{}{}", self.root, self.api_prefix, path)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

pub async fn spawn(config: ManagerConfig) -> TestServer {
    spawn_with_store(config, Arc::new(ResourceStore::new())).await
}

pub async fn spawn_with_store(config: ManagerConfig, store: Arc<ResourceStore>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(&config, store.clone()).unwrap();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        root: format!("http://{addr}"),
        store,
        shutdown,
        client: reqwest::Client::new(),
        handle,
        api_prefix: config.server.api_prefix().to_string(),
    }
}

/// Sends `body` to `url` and returns the status code and parsed JSON body.
pub async fn post(server: &TestServer, path: &str, body: Value) -> (u16, Value) {
    let res = server
        .client
        .post(server.api(path))
        .json(&body)
        .send()
        .await
        .unwrap();
    read(res).await
}

pub async fn get(server: &TestServer, path: &str) -> (u16, Value) {
    let res = server.client.get(server.api(path)).send().await.unwrap();
    read(res).await
}

pub async fn delete(server: &TestServer, path: &str) -> (u16, Value) {
    let res = server.client.delete(server.api(path)).send().await.unwrap();
    read(res).await
}

pub async fn read(res: reqwest::Response) -> (u16, Value) {
    let status = res.status().as_u16();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}
