//! HTTP API integration tests
//!
//! Exercises routing and request validation through the real router.
//! No upstream credentials are configured, so every path stays
//! offline: validation failures reject before any catalog call, and
//! the one generation that proceeds has nothing to fetch.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use mixroom_gen::services::request_gate::RequestGate;
use mixroom_gen::services::{LastfmClient, PlaylistGenerator, SpotifyClient};
use mixroom_gen::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app_state() -> AppState {
    let spotify = Arc::new(SpotifyClient::new(RequestGate::default()).unwrap());
    let lastfm = Arc::new(LastfmClient::new(None).unwrap());
    let generator = Arc::new(PlaylistGenerator::new(spotify, lastfm, "global".to_string()));
    AppState::new(generator)
}

fn post_generate(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_module_and_version() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mixroom-gen");
    assert!(body["uptime_seconds"].as_u64().is_some());
}

#[tokio::test]
async fn test_generate_rejects_empty_member_list() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(post_generate(json!({
            "accessToken": "token",
            "members": []
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "No members with preferences");
}

#[tokio::test]
async fn test_generate_rejects_blank_token() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(post_generate(json!({
            "accessToken": "   ",
            "members": [{
                "memberId": "m1",
                "displayName": "Alice",
                "genres": [{"value": "jazz"}],
                "artists": []
            }]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_generate_rejects_unknown_mode() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(post_generate(json!({
            "accessToken": "token",
            "members": [{
                "memberId": "m1",
                "displayName": "Alice",
                "genres": [],
                "artists": []
            }],
            "mode": "rave"
        })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_generate_empty_result_is_not_found() {
    // One member with no preferences at all and no secondary catalog:
    // every branch yields nothing, which surfaces as 404
    let app = build_router(test_app_state());

    let response = app
        .oneshot(post_generate(json!({
            "accessToken": "token",
            "members": [{
                "memberId": "m1",
                "displayName": "Alice",
                "genres": [],
                "artists": []
            }]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/playlists")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
