//! Rate limiting over HTTP.

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_limit_per_forwarded_client() {
    let portal = common::spawn_portal(common::config_with_capacity(3)).await;
    let token = portal.register("busy@example.com").await;

    for _ in 0..3 {
        let response = portal
            .client
            .get(portal.url("/tracking/my-shipments"))
            .bearer_auth(&token)
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let limited = portal
        .client
        .get(portal.url("/tracking/my-shipments"))
        .bearer_auth(&token)
        .header("X-Forwarded-For", "203.0.113.7")
        .send()
        .await
        .unwrap();
    assert_eq!(limited.status(), 429);
    assert_eq!(
        limited.json::<Value>().await.unwrap(),
        json!({ "error": "Rate limit exceeded. Please try again later." })
    );

    let other_client = portal
        .client
        .get(portal.url("/tracking/my-shipments"))
        .bearer_auth(&token)
        .header("X-Forwarded-For", "198.51.100.2")
        .send()
        .await
        .unwrap();
    assert_eq!(other_client.status(), 200);
}

#[tokio::test]
async fn test_exhausted_client_is_rejected_before_auth() {
    let portal = common::spawn_portal(common::config_with_capacity(2)).await;

    for _ in 0..2 {
        let response = portal
            .client
            .get(portal.url("/reports/statistics"))
            .header("X-Forwarded-For", "192.0.2.10")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    let response = portal
        .client
        .get(portal.url("/reports/statistics"))
        .header("X-Forwarded-For", "192.0.2.10")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
}

#[tokio::test]
async fn test_concurrent_requests_never_exceed_capacity() {
    let portal = common::spawn_portal(common::config_with_capacity(10)).await;
    let token = portal.register("burst@example.com").await;

    let requests = (0..40).map(|_| {
        portal
            .client
            .get(portal.url("/reports/statistics"))
            .bearer_auth(&token)
            .header("X-Forwarded-For", "198.51.100.99")
            .send()
    });
    let responses = futures_util::future::join_all(requests).await;

    let allowed = responses
        .iter()
        .filter(|r| r.as_ref().map(|r| r.status() == 200).unwrap_or(false))
        .count();
    let limited = responses
        .iter()
        .filter(|r| r.as_ref().map(|r| r.status() == 429).unwrap_or(false))
        .count();
    assert_eq!(allowed, 10);
    assert_eq!(limited, 30);
}

#[tokio::test]
async fn test_auth_routes_are_not_limited() {
    let portal = common::spawn_portal(common::config_with_capacity(1)).await;
    for i in 0..3 {
        portal.register(&format!("user{i}@example.com")).await;
    }
}
