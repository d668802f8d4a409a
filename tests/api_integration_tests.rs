//! Integration Tests for the admin API
//!
//! Tests full request/response cycle for each admin endpoint.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use caching_proxy::{api::create_router, cache, AppState, CacheEntry, CacheStore, SharedCache};
use serde_json::Value;
use tower::ServiceExt;

use common::{proxy_get, response_with_body, start_mock_origin, start_proxy};

// == Helper Functions ==

fn create_test_app(cache: SharedCache) -> Router {
    create_router(AppState::new(cache))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_empty_cache() {
    let app = create_test_app(cache::shared(CacheStore::new(1000)));

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 0);
    assert_eq!(json["misses"], 0);
    assert_eq!(json["total_entries"], 0);
    assert_eq!(json["capacity_bytes"], 1000);
}

#[tokio::test]
async fn test_stats_endpoint_counts_evictions() {
    let shared = cache::shared(CacheStore::new(10));
    {
        let mut store = shared.write().await;
        store.insert(CacheEntry::new("http://a.test/1", vec![0u8; 6]));
        store.insert(CacheEntry::new("http://a.test/2", vec![0u8; 6]));
    }
    let app = create_test_app(shared);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["insertions"], 2);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["total_bytes"], 6);
}

#[tokio::test]
async fn test_stats_reflect_proxy_traffic() {
    let origin = start_mock_origin(response_with_body(32)).await;
    let (proxy, ctx) = start_proxy(1_049_000, 102_400).await;
    let url = format!("http://{}/stats-check", origin.addr);

    proxy_get(proxy, &url).await;
    proxy_get(proxy, &url).await;

    let response = create_test_app(ctx.cache.clone())
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(cache::shared(CacheStore::new(1000)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let app = create_test_app(cache::shared(CacheStore::new(1000)));

    let response = app
        .oneshot(Request::builder().uri("/get/anything").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Live Server ==

#[tokio::test]
async fn test_live_admin_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_test_app(cache::shared(CacheStore::new(1000)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let json: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["status"], "healthy");
}
