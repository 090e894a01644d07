use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::adapters::{CatalogAdapter, ExplanationAdapter, RetrievalAdapter};
use super::domain::Build;
use super::optimizer::{BuildOptimizer, OptimizationRequest};

/// Router builder exposing the optimization and advice endpoints.
pub fn build_router<R, C, E>(optimizer: Arc<BuildOptimizer<R, C, E>>) -> Router
where
    R: RetrievalAdapter + 'static,
    C: CatalogAdapter + 'static,
    E: ExplanationAdapter + 'static,
{
    Router::new()
        .route("/api/v1/builds/optimize", post(optimize_handler::<R, C, E>))
        .route("/api/v1/builds/advice", post(advice_handler::<R, C, E>))
        .with_state(optimizer)
}

pub(crate) async fn optimize_handler<R, C, E>(
    State(optimizer): State<Arc<BuildOptimizer<R, C, E>>>,
    axum::Json(request): axum::Json<OptimizationRequest>,
) -> Response
where
    R: RetrievalAdapter + 'static,
    C: CatalogAdapter + 'static,
    E: ExplanationAdapter + 'static,
{
    if request.purpose.trim().is_empty() {
        let payload = json!({
            "error": "purpose must not be empty",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let outcome = optimizer.optimize(request).await;
    (StatusCode::OK, axum::Json(outcome)).into_response()
}

pub(crate) async fn advice_handler<R, C, E>(
    State(optimizer): State<Arc<BuildOptimizer<R, C, E>>>,
    axum::Json(build): axum::Json<Build>,
) -> Response
where
    R: RetrievalAdapter + 'static,
    C: CatalogAdapter + 'static,
    E: ExplanationAdapter + 'static,
{
    let suggestions = optimizer.advise(build).await;
    let payload = json!({
        "suggestions": suggestions,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
