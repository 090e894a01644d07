use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::builds::domain::Build;
use crate::builds::optimizer::OptimizationRequest;
use crate::builds::router::{build_router, optimize_handler};

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn optimize_route_returns_the_outcome() {
    let router = build_router(Arc::new(optimizer(
        PoolRetrieval::new(vec![(psu("750w", 750.0, 1000.0), 0.9)]),
        MemoryCatalog::default(),
        StaticExplainer("balanced build"),
    )));

    let response = router
        .oneshot(json_request(
            "/api/v1/builds/optimize",
            json!({ "purpose": "1440p gaming" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["purpose"], "1440p gaming");
    assert_eq!(payload["profile"]["kind"], "qhd_gaming");
    assert_eq!(payload["build"]["slots"]["psu"]["id"], "750w");
    assert_eq!(payload["explanation"], "balanced build");
    assert_eq!(payload["explanation_source"], "generated");
    assert!(payload["flags"]
        .as_array()
        .expect("flags array")
        .iter()
        .any(|flag| flag["kind"] == "requirement_unmet" && flag["slot"] == "gpu"));
}

#[tokio::test]
async fn blank_purpose_is_rejected() {
    let optimizer = Arc::new(optimizer(
        PoolRetrieval::default(),
        MemoryCatalog::default(),
        StaticExplainer("ok"),
    ));

    let response = optimize_handler(
        State(optimizer),
        axum::Json(OptimizationRequest::new("   ", Build::default())),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "purpose must not be empty");
}

#[tokio::test]
async fn misplaced_component_is_a_client_error() {
    let router = build_router(Arc::new(optimizer(
        PoolRetrieval::default(),
        MemoryCatalog::default(),
        StaticExplainer("ok"),
    )));
    let component = serde_json::to_value(gpu("rtx-4070", "NVIDIA", 12.0, 6500.0)).unwrap();

    let response = router
        .oneshot(json_request(
            "/api/v1/builds/optimize",
            json!({
                "purpose": "gaming",
                "current_build": { "purpose": "gaming", "slots": { "cpu": component } }
            }),
        ))
        .await
        .expect("route executes");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn advice_route_lists_suggestions() {
    let router = build_router(Arc::new(optimizer(
        PoolRetrieval::default(),
        MemoryCatalog::new(vec![ram("ddr5-32", 32.0, 1400.0)]),
        StaticExplainer("ok"),
    )));
    let build = Build::new("video editing").with(ram("ddr4-16", 16.0, 600.0));

    let response = router
        .oneshot(json_request(
            "/api/v1/builds/advice",
            serde_json::to_value(&build).unwrap(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let suggestions = payload["suggestions"].as_array().expect("suggestions");
    let ram_advice = suggestions
        .iter()
        .find(|s| s["kind"]["rule"] == "ram_capacity")
        .expect("ram advice");
    assert_eq!(ram_advice["slot"], "ram");
    assert_eq!(ram_advice["suggested_component_id"], "ddr5-32");
}
