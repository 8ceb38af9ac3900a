//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use shipment_portal::config::PortalConfig;
use shipment_portal::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A portal serving on an ephemeral local port.
pub struct TestPortal {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestPortal {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register `email` and return its bearer token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "password": "s3cret-pass",
                "first_name": "Test",
                "last_name": "User",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "registration of {email} failed");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a shipment for `token` and return its JSON.
    pub async fn create_shipment(&self, token: &str, recipient: &str) -> Value {
        let response = self
            .client
            .post(self.url("/tracking/create"))
            .bearer_auth(token)
            .json(&json!({
                "recipient_name": recipient,
                "recipient_address": "475 L'Enfant Plaza SW",
                "recipient_city": "Washington",
                "recipient_state": "DC",
                "recipient_zip_code": "20260",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}

impl Drop for TestPortal {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a portal with `config` on 127.0.0.1:0.
pub async fn spawn_portal(config: PortalConfig) -> TestPortal {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    TestPortal { addr, client, shutdown }
}

/// Default config with a small rate limit.
pub fn config_with_capacity(capacity: u32) -> PortalConfig {
    let mut config = PortalConfig::default();
    config.rate_limit.capacity = capacity;
    config.rate_limit.refill_tokens = capacity;
    config.observability.metrics_enabled = false;
    config
}
