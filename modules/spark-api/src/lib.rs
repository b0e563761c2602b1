pub mod routes;
pub mod worker;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use spark_common::scoring::ScoreVariant;
use spark_common::Config;
use spark_engine::ReplyStore;

/// Shared state for the ingestion boundary. The boundary computes scores
/// itself, with the same calculator and configuration the orchestrator's
/// gate reads, so the two sites cannot drift.
pub struct AppState {
    pub store: Arc<dyn ReplyStore>,
    pub score_variant: ScoreVariant,
    pub age_cutoff_minutes: i64,
    pub gate_threshold: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn ReplyStore>, config: &Config) -> Self {
        Self {
            store,
            score_variant: config.score_variant,
            age_cutoff_minutes: config.age_cutoff_minutes,
            gate_threshold: config.gate_threshold,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/api/replies",
            post(routes::api_ingest).get(routes::api_list),
        )
        .route("/api/replies/{id}", axum::routing::delete(routes::api_delete))
        .route("/api/replies/{id}/posted", post(routes::api_mark_posted))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
