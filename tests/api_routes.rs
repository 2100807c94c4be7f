use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tower::ServiceExt;

use microbiome_studio::api;
use microbiome_studio::runtime::spawn_studio;
use microbiome_studio::simulation::{
    ConstantNoise, ObserverSnapshot, SPECIES_COUNT, StudioConfig, StudioWorld,
};

fn studio_app() -> (Router, Arc<Notify>) {
    let observer = Arc::new(RwLock::new(ObserverSnapshot::default()));
    let studio = StudioWorld::with_noise(
        StudioConfig::default(),
        observer,
        Box::new(ConstantNoise(1.0)),
    );
    let shutdown = Arc::new(Notify::new());
    let (handle, _task) = spawn_studio(studio, shutdown.clone());
    (api::router(handle), shutdown)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_catalog_lists_species_and_baselines() {
    let (app, shutdown) = studio_app();
    let (status, body) = call(&app, "GET", "/api/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["species"].as_array().unwrap().len(), SPECIES_COUNT);
    assert_eq!(body["baselines"].as_array().unwrap().len(), 3);
    assert!(!body["factors"].as_array().unwrap().is_empty());
    shutdown.notify_one();
}

#[tokio::test]
async fn test_initial_state_is_empty() {
    let (app, shutdown) = studio_app();
    let (status, body) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "Empty");
    assert_eq!(
        body["status_line"],
        "Select baseline & dietary factors, then run first phase"
    );

    let (_, diversity) = call(&app, "GET", "/api/diversity", None).await;
    assert!(diversity["shannon"].as_array().unwrap().is_empty());
    shutdown.notify_one();
}

#[tokio::test]
async fn test_phase_then_append_grows_the_session() {
    let (app, shutdown) = studio_app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/phase",
        Some(json!({ "baseline": 0, "factors": ["fiber"], "days": 180 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "Populated");
    assert_eq!(body["status_line"], "Phase end: day 180 — ready to append");
    assert_eq!(body["session"]["time_axis"].as_array().unwrap().len(), 26);

    let (status, body) = call(
        &app,
        "POST",
        "/api/append",
        Some(json!({ "factors": ["soda"], "days": 180 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["cumulative_days"], 360);
    assert_eq!(body["session"]["time_axis"][26], 187);
    assert_eq!(body["diversity"]["simpson"].as_array().unwrap().len(), 51);

    let (_, diversity) = call(&app, "GET", "/api/diversity", None).await;
    assert_eq!(diversity["shannon"].as_array().unwrap().len(), 51);
    shutdown.notify_one();
}

#[tokio::test]
async fn test_append_before_any_phase_is_rejected() {
    let (app, shutdown) = studio_app();
    let (status, body) = call(&app, "POST", "/api/append", Some(json!({ "days": 30 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    let (_, state) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(state["state"], "Empty");
    shutdown.notify_one();
}

#[tokio::test]
async fn test_rejected_append_leaves_selection_alone() {
    let (app, shutdown) = studio_app();
    let (status, _) = call(
        &app,
        "POST",
        "/api/append",
        Some(json!({ "factors": ["soda", "fried"], "days": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, state) = call(&app, "GET", "/api/state", None).await;
    assert!(state["selection"]["factors"].as_array().unwrap().is_empty());
    assert_eq!(state["selection"]["days"], 180);
    shutdown.notify_one();
}

#[tokio::test]
async fn test_oversized_phase_is_rejected_and_studio_stays_up() {
    let (app, shutdown) = studio_app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/phase",
        Some(json!({ "baseline": 0, "days": u32::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("longer than allowed")));

    let (status, body) = call(&app, "POST", "/api/phase", Some(json!({ "days": 720 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["cumulative_days"], 720);

    let (status, _) = call(&app, "POST", "/api/append", Some(json!({ "days": 721 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, state) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(state["session"]["cumulative_days"], 720);
    shutdown.notify_one();
}

#[tokio::test]
async fn test_invalid_phase_requests_are_rejected() {
    let (app, shutdown) = studio_app();
    let (status, _) = call(&app, "POST", "/api/phase", Some(json!({ "baseline": 9 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(&app, "POST", "/api/phase", Some(json!({ "days": 0 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, state) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(state["selection"]["baseline"], 0);
    shutdown.notify_one();
}

#[tokio::test]
async fn test_reset_clears_history() {
    let (app, shutdown) = studio_app();
    call(
        &app,
        "POST",
        "/api/phase",
        Some(json!({ "baseline": 2, "factors": ["olive", "dairy"], "days": 90 })),
    )
    .await;

    let (status, body) = call(&app, "POST", "/api/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "Empty");
    assert_eq!(body["session"]["cumulative_days"], 0);
    assert!(body["session"]["time_axis"].as_array().unwrap().is_empty());
    assert_eq!(body["selection"]["baseline"], 0);
    assert_eq!(body["selection"]["days"], 180);
    assert!(body["selection"]["factors"].as_array().unwrap().is_empty());
    shutdown.notify_one();
}
