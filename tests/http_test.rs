mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::TestApp;
use prompip_backend::http::create_router;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn verify_request(prompt_id: Uuid, wallet: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/prompts/{}/verify", prompt_id))
        .header("content-type", "application/json")
        .header("x-wallet-address", wallet)
        .body(Body::from(body.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn test_malformed_verify_body_is_bad_request() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let prompt = app.prompt(creator.id, "Summarizer").await;
    let router = create_router(Arc::new(app.state));

    // Missing the required isUseful field
    let response = router
        .clone()
        .oneshot(verify_request(prompt.id, "0xverifier", r#"{"feedback":"nice"}"#))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unparseable JSON
    let response = router
        .clone()
        .oneshot(verify_request(prompt.id, "0xverifier", "{not json"))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing content type
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/prompts/{}/verify", prompt.id))
                .header("x-wallet-address", "0xverifier")
                .body(Body::from(r#"{"isUseful":true}"#))
                .expect("build request"),
        )
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_status_codes() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let prompt = app.prompt(creator.id, "Scored").await;
    let router = create_router(Arc::new(app.state));

    // No wallet header
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/prompts/{}/verify", prompt.id))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"isUseful":true}"#))
                .expect("build request"),
        )
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown prompt
    let response = router
        .clone()
        .oneshot(verify_request(Uuid::new_v4(), "0xverifier", r#"{"isUseful":true}"#))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Creator judging their own prompt
    let response = router
        .clone()
        .oneshot(verify_request(prompt.id, "0xcreator", r#"{"isUseful":true}"#))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // First submission lands, the repeat conflicts
    let response = router
        .clone()
        .oneshot(verify_request(prompt.id, "0xverifier", r#"{"isUseful":true}"#))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(verify_request(prompt.id, "0xverifier", r#"{"isUseful":false}"#))
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let router = create_router(Arc::new(app.state));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request completes");
    assert_eq!(response.status(), StatusCode::OK);
}
