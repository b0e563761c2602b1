use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use spark_common::scoring::score;
use spark_common::types::{Candidate, EngagementMetrics, ReplyRecord, ReplyStatus, Topic};
use spark_engine::{ReplyPatch, ReplyStore};

use crate::AppState;

/// Candidate payload from the scanner (or any other submitter). Metric
/// fields default to zero like every other unparseable metric in the
/// system.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub permalink_url: String,
    pub body_text: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub quoted_text: Option<String>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub repost_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub view_count: u64,
    pub source_created_at: DateTime<Utc>,
}

/// Ingest one candidate: compute the score and gate-eligibility up front so
/// the dashboard sees an immediate verdict, enforce permalink uniqueness by
/// deleting any prior record first, then insert.
pub async fn api_ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestRequest>,
) -> impl IntoResponse {
    if body.permalink_url.trim().is_empty() || body.body_text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "permalink_url and body_text are required"})),
        )
            .into_response();
    }

    let now = Utc::now();
    let metrics = EngagementMetrics {
        like_count: body.like_count,
        repost_count: body.repost_count,
        reply_count: body.reply_count,
        view_count: body.view_count,
    };
    let computed_score = score(
        &metrics,
        body.source_created_at,
        now,
        state.score_variant,
        state.age_cutoff_minutes,
    );

    let candidate = Candidate {
        permalink_url: body.permalink_url.trim().to_string(),
        author_name: body
            .author_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        body_text: body.body_text,
        quoted_text: body.quoted_text.filter(|q| !q.trim().is_empty()),
        created_at: body.source_created_at,
        metrics,
        score: computed_score,
    };

    // Re-ingestion of a permalink is the one permitted reset: the prior
    // record is deleted and a fresh one takes its place.
    match state.store.find_by_permalink(&candidate.permalink_url).await {
        Ok(Some(existing)) => {
            info!(
                permalink = candidate.permalink_url.as_str(),
                prior_id = %existing.id,
                "Replacing prior record for re-ingested permalink"
            );
            if let Err(e) = state.store.delete(existing.id).await {
                warn!(error = %e, "Failed to delete prior record");
                return store_error(e);
            }
        }
        Ok(None) => {}
        Err(e) => return store_error(e),
    }

    let eligible = computed_score >= state.gate_threshold;
    let status = if eligible {
        ReplyStatus::Pending
    } else {
        ReplyStatus::Rejected
    };
    let mut record = ReplyRecord::from_candidate(&candidate, status, now);
    if !eligible {
        record.topic = Some(Topic::placeholder());
    }

    let id = match state.store.create(record).await {
        Ok(id) => id,
        Err(e) => return store_error(e),
    };

    info!(
        %id,
        permalink = candidate.permalink_url.as_str(),
        score = computed_score,
        status = %status,
        "Candidate ingested"
    );

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "score": computed_score,
            "status": status,
        })),
    )
        .into_response()
}

/// All records, newest first. This is what the review dashboard reads.
pub async fn api_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => store_error(e),
    }
}

/// Explicit user deletion.
pub async fn api_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error(e),
    }
}

/// Review action: a generated record was actually posted.
pub async fn api_mark_posted(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state
        .store
        .transition(
            id,
            ReplyStatus::Generated,
            ReplyPatch::status(ReplyStatus::Posted),
        )
        .await
    {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "record is not in generated status"})),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

fn store_error(e: spark_common::SparkError) -> axum::response::Response {
    let status = match &e {
        spark_common::SparkError::NotFound(_) => StatusCode::NOT_FOUND,
        spark_common::SparkError::InvalidTransition(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
}
