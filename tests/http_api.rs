mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use common::{Harness, RecordingMusic};
use sotw_back::{config::AppConfig, routes, state::AppState};

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthcheck_reports_ok_with_storage() {
    let h = Harness::new().await;
    let response = routes::router(h.state.clone())
        .oneshot(request("GET", "/healthcheck", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn degraded_mode_answers_503() {
    let state = AppState::new(AppConfig::default(), Arc::new(RecordingMusic::default()));
    let app = routes::router(state);

    let health = app
        .clone()
        .oneshot(request("GET", "/healthcheck", None, None))
        .await
        .unwrap();
    assert_eq!(json_body(health).await["status"], "degraded");

    let response = app
        .oneshot(request(
            "POST",
            "/participants",
            None,
            Some(json!({ "name": "Ann" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn group_lifecycle_over_http() {
    let h = Harness::new().await;
    let app = routes::router(h.state.clone());

    let mut ids = Vec::new();
    for name in ["Ann", "Bob", "Cat"] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/participants",
                None,
                Some(json!({ "name": name })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(json_body(response).await["id"].as_str().unwrap().to_owned());
    }

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/groups",
            Some(&ids[0]),
            Some(json!({ "name": "Friends", "weekday": 0, "hour": 18, "minute": 0, "timezone": "UTC" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = json_body(response).await;
    let group_id = group["id"].as_str().unwrap().to_owned();
    assert_eq!(group["members"].as_array().unwrap().len(), 1);
    assert!(group.get("pending_theme").is_none());

    for id in &ids[1..] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/groups/{group_id}/members"),
                Some(id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/groups/{group_id}/rounds/current"),
            Some(&ids[1]),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let current = json_body(response).await;
    assert_eq!(current["status"], "open");
    assert_eq!(current["round"]["number"], 0);
    assert_eq!(current["submitted"], false);
    assert!(current["round"].get("survey").is_none());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/groups/{group_id}/rounds/0/submission"),
            Some(&ids[1]),
            Some(json!({ "track_id": "4uLU6hMCjMI75M1A2tKUQC" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["song"]["name"],
        "Song 4uLU6hMCjMI75M1A2tKUQC - The Testers"
    );

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/groups/{group_id}/rounds/3/submission"),
            Some(&ids[1]),
            Some(json!({ "track_id": "abc" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/groups/{group_id}/rounds/0/results"),
            Some(&ids[2]),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_header_is_required() {
    let h = Harness::new().await;
    let app = routes::router(h.state.clone());
    let body = json!({ "name": "Friends", "weekday": 0, "hour": 18, "minute": 0 });

    let missing = app
        .clone()
        .oneshot(request("POST", "/groups", None, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let malformed = app
        .oneshot(request("POST", "/groups", Some("not-a-uuid"), Some(body)))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let h = Harness::new().await;
    let ann = h.participant("Ann").await;
    let app = routes::router(h.state.clone());
    let user = ann.id.to_string();

    let bad_timezone = app
        .clone()
        .oneshot(request(
            "POST",
            "/groups",
            Some(&user),
            Some(json!({ "name": "Friends", "weekday": 0, "hour": 18, "minute": 0, "timezone": "Moon/Base" })),
        ))
        .await
        .unwrap();
    assert_eq!(bad_timezone.status(), StatusCode::BAD_REQUEST);

    let bad_weekday = app
        .clone()
        .oneshot(request(
            "POST",
            "/groups",
            Some(&user),
            Some(json!({ "name": "Friends", "weekday": 9, "hour": 18, "minute": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(bad_weekday.status(), StatusCode::BAD_REQUEST);

    let blank_name = app
        .oneshot(request(
            "POST",
            "/participants",
            None,
            Some(json!({ "name": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(blank_name.status(), StatusCode::BAD_REQUEST);
}
