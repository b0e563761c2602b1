// Ingestion boundary behavior: boundary-computed scores, instant gate
// verdicts, permalink re-ingestion resets, and the creation-event wiring
// that drives the generation worker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use ai_client::Generator;
use spark_api::routes::{api_ingest, api_mark_posted, IngestRequest};
use spark_api::worker::spawn_generation_worker;
use spark_api::AppState;
use spark_common::scoring::ScoreVariant;
use spark_common::types::{Candidate, EngagementMetrics, ReplyRecord, ReplyStatus, Topic};
use spark_engine::prompt::ReplyPromptBuilder;
use spark_engine::{GenerationOrchestrator, MemoryReplyStore, OrchestratorConfig, ReplyStore};

fn state(store: Arc<MemoryReplyStore>, gate_threshold: i64) -> Arc<AppState> {
    Arc::new(AppState {
        store,
        score_variant: ScoreVariant::ViewWeighted,
        age_cutoff_minutes: 120,
        gate_threshold,
    })
}

fn request(permalink: &str, minutes_ago: i64) -> IngestRequest {
    IngestRequest {
        permalink_url: permalink.to_string(),
        body_text: "an interesting post".to_string(),
        author_name: Some("Author".to_string()),
        quoted_text: None,
        like_count: 100,
        repost_count: 10,
        reply_count: 2,
        view_count: 5000,
        source_created_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn ingest_computes_score_at_the_boundary() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 100);

    let response = api_ingest(State(state), Json(request("https://x.com/a/status/1", 5)))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    let record = store
        .find_by_permalink("https://x.com/a/status/1")
        .await
        .unwrap()
        .unwrap();
    // (100 + 30 + 10 + 5000/100) * 10 / (5 + 10) = 126, above the gate.
    assert_eq!(record.score, 126);
    assert_eq!(record.status, ReplyStatus::Pending);
    assert_eq!(record.author_name, "Author");
}

#[tokio::test]
async fn below_gate_is_rejected_instantly() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 200);
    let mut watch = store.watch_created();

    let response = api_ingest(State(state), Json(request("https://x.com/a/status/2", 5)))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    let record = store
        .find_by_permalink("https://x.com/a/status/2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ReplyStatus::Rejected);
    assert_eq!(record.topic, Some(Topic::placeholder()));
    // Rejected records never wake the generation worker.
    assert!(watch.try_recv().is_err());
}

#[tokio::test]
async fn stale_source_scores_zero() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 200);

    api_ingest(State(state), Json(request("https://x.com/a/status/3", 300)))
        .await
        .into_response();

    let record = store
        .find_by_permalink("https://x.com/a/status/3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.score, 0);
    assert_eq!(record.status, ReplyStatus::Rejected);
}

#[tokio::test]
async fn reingesting_a_permalink_replaces_the_prior_record() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 100);

    api_ingest(
        State(state.clone()),
        Json(request("https://x.com/a/status/4", 5)),
    )
    .await
    .into_response();
    let first = store
        .find_by_permalink("https://x.com/a/status/4")
        .await
        .unwrap()
        .unwrap();

    api_ingest(State(state), Json(request("https://x.com/a/status/4", 5)))
        .await
        .into_response();
    let second = store
        .find_by_permalink("https://x.com/a/status/4")
        .await
        .unwrap()
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(store.get(first.id).await.unwrap().is_none());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 100);

    let mut bad = request("", 5);
    bad.body_text = "text".to_string();
    let response = api_ingest(State(state.clone()), Json(bad)).await.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad = request("https://x.com/a/status/5", 5);
    bad.body_text = "  ".to_string();
    let response = api_ingest(State(state), Json(bad)).await.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_posted_requires_generated_status() {
    let store = Arc::new(MemoryReplyStore::new());
    let state = state(store.clone(), 100);
    let now = Utc::now();

    let candidate = Candidate {
        permalink_url: "https://x.com/a/status/6".to_string(),
        author_name: "a".to_string(),
        body_text: "b".to_string(),
        quoted_text: None,
        created_at: now,
        metrics: EngagementMetrics::default(),
        score: 300,
    };
    let generated = store
        .create(ReplyRecord::from_candidate(
            &candidate,
            ReplyStatus::Generated,
            now,
        ))
        .await
        .unwrap();
    let pending = {
        let mut c = candidate.clone();
        c.permalink_url = "https://x.com/a/status/7".to_string();
        store
            .create(ReplyRecord::from_candidate(&c, ReplyStatus::Pending, now))
            .await
            .unwrap()
    };

    let response = api_mark_posted(State(state.clone()), Path(generated))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        store.get(generated).await.unwrap().unwrap().status,
        ReplyStatus::Posted
    );

    let response = api_mark_posted(State(state), Path(pending)).await.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// --- Creation event drives the orchestrator ---

struct FixedGenerator;

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _: &str, _: &str, _: &str, _: &str) -> Result<String> {
        Ok(r#"{"topic": "SaaS", "suggestions": ["a", "b", "c"]}"#.to_string())
    }
}

async fn wait_for_resolution(store: &MemoryReplyStore, id: Uuid) -> ReplyRecord {
    for _ in 0..100 {
        let record = store.get(id).await.unwrap().unwrap();
        if record.status != ReplyStatus::Pending {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("record {id} never resolved");
}

#[tokio::test]
async fn creation_event_triggers_generation() {
    let store = Arc::new(MemoryReplyStore::new());
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        store.clone(),
        Arc::new(FixedGenerator),
        ReplyPromptBuilder::new(3, Vec::new()),
        OrchestratorConfig {
            gate_threshold: 100,
            models: vec!["gemini-x".to_string()],
            credentials: vec!["k1".to_string()],
            suggestion_count: 3,
        },
    ));
    let worker = spawn_generation_worker(store.clone(), orchestrator);

    let state = state(store.clone(), 100);
    api_ingest(State(state), Json(request("https://x.com/a/status/8", 5)))
        .await
        .into_response();

    let id = store
        .find_by_permalink("https://x.com/a/status/8")
        .await
        .unwrap()
        .unwrap()
        .id;
    let resolved = wait_for_resolution(&store, id).await;
    assert_eq!(resolved.status, ReplyStatus::Generated);
    assert_eq!(resolved.suggestions.len(), 3);
    assert_eq!(resolved.used_model.as_deref(), Some("gemini-x"));

    worker.abort();
}
