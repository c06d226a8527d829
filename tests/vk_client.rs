//! VkClient and EgoCrawler against a local stand-in for api.vk.com.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tempfile::TempDir;

use friendgraph::config::{CrawlConfig, VkConfig};
use friendgraph::graph::{count_unique_edges, find_friend_chain, load_graph};
use friendgraph::{EgoCrawler, FriendGraphError, VkClient};

const TOKEN: &str = "test-token";

async fn friends_get(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("access_token").map(String::as_str) != Some(TOKEN) {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }
    if params.get("v").map(String::as_str) != Some("5.199") {
        return (StatusCode::BAD_REQUEST, "missing version").into_response();
    }

    let friends = |items: &[i64]| Json(json!({"response": {"count": items.len(), "items": items}}));

    match params.get("user_id").map(String::as_str) {
        Some("1") => friends(&[2, 3]).into_response(),
        Some("2") => friends(&[1, 4]).into_response(),
        Some("3") => Json(json!({"error": {"error_code": 30, "error_msg": "This profile is private"}}))
            .into_response(),
        Some("10") => friends(&[500, 2]).into_response(),
        Some("500") => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        _ => friends(&[]).into_response(),
    }
}

/// Serve the fake API on an ephemeral port and return its base URL.
async fn spawn_vk() -> String {
    let app = Router::new().route("/method/friends.get", get(friends_get));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/method/", addr)
}

fn vk_config(base_url: String) -> VkConfig {
    VkConfig {
        base_url,
        timeout_secs: 5,
        ..VkConfig::default()
    }
}

fn fast_crawl() -> CrawlConfig {
    CrawlConfig {
        request_delay_ms: 0,
        max_retries: 0,
        checkpoint_every: 0,
        fail_fast: false,
    }
}

#[tokio::test]
async fn test_get_friends_returns_items_in_order() {
    let base = spawn_vk().await;
    let client = VkClient::new(&vk_config(base), TOKEN.to_string()).unwrap();

    assert_eq!(client.get_friends(2).await.unwrap(), vec![1, 4]);
}

#[tokio::test]
async fn test_private_profile_is_empty() {
    let base = spawn_vk().await;
    let client = VkClient::new(&vk_config(base), TOKEN.to_string()).unwrap();

    assert!(client.get_friends(3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_error_is_fetch_failed() {
    let base = spawn_vk().await;
    let client = VkClient::new(&vk_config(base), TOKEN.to_string()).unwrap();

    let err = client.get_friends(500).await.unwrap_err();
    match err {
        FriendGraphError::FetchFailed { user_id, status, .. } => {
            assert_eq!(user_id, 500);
            assert_eq!(status, Some(500));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_bad_token_is_not_retryable() {
    let base = spawn_vk().await;
    let client = VkClient::new(&vk_config(base), "wrong".to_string()).unwrap();

    let err = client.get_friends(1).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_network_error_does_not_leak_token() {
    // Reserve a port, then close it so the connection is refused
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let secret = "SUPERSECRET123";
    let client = VkClient::new(&vk_config(format!("http://{}/method/", addr)), secret.to_string()).unwrap();

    let err = client.get_friends(5).await.unwrap_err();
    assert!(matches!(err, FriendGraphError::FetchFailed { user_id: 5, status: None, .. }));
    assert!(err.is_retryable());
    let message = err.to_string();
    assert!(!message.contains(secret), "token leaked: {message}");
    assert!(!message.contains("access_token"), "query leaked: {message}");
}

#[tokio::test]
async fn test_crawl_then_analyze() {
    let base = spawn_vk().await;
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.json");

    let client = VkClient::new(&vk_config(base), TOKEN.to_string()).unwrap();
    let report = EgoCrawler::new(client, fast_crawl())
        .with_store(&path)
        .crawl(1)
        .await
        .unwrap();
    assert!(report.failures.is_empty());

    let graph = load_graph(&path).unwrap();
    assert_eq!(graph, report.graph);
    assert_eq!(graph.friends(1), Some(&[2, 3][..]));
    assert_eq!(graph.friends(3), Some(&[][..]));
    assert_eq!(graph.friends(4), Some(&[][..]));
    assert_eq!(count_unique_edges(&graph), 3);

    let chain = find_friend_chain(&graph, 1, 4).unwrap();
    assert_eq!(chain.ids(), &[1, 2, 4]);
    assert!(matches!(
        find_friend_chain(&graph, 3, 4),
        Err(FriendGraphError::PathNotFound { .. })
    ));
}

#[tokio::test]
async fn test_crawl_survives_server_error_for_one_friend() {
    let base = spawn_vk().await;
    let client = VkClient::new(&vk_config(base), TOKEN.to_string()).unwrap();

    let report = EgoCrawler::new(client, fast_crawl()).crawl(10).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, 500);
    assert_eq!(report.graph.friends(500), Some(&[][..]));
    assert_eq!(report.graph.friends(2), Some(&[1, 4][..]));
}
