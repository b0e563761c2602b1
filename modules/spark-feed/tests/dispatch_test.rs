// End-to-end dispatch: the HTTP sink posting into a live ingestion router,
// exactly the path a scan's top-K takes in deployment.

use std::sync::Arc;

use chrono::Utc;

use spark_api::AppState;
use spark_common::scoring::ScoreVariant;
use spark_common::types::{Candidate, EngagementMetrics, ReplyStatus};
use spark_engine::{MemoryReplyStore, ReplyStore};
use spark_feed::dispatch::{CandidateSink, HttpSink};

async fn serve(store: Arc<MemoryReplyStore>, gate_threshold: i64) -> String {
    let state = Arc::new(AppState {
        store,
        score_variant: ScoreVariant::ViewWeighted,
        age_cutoff_minutes: 120,
        gate_threshold,
    });
    let app = spark_api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/replies")
}

fn candidate(permalink: &str) -> Candidate {
    Candidate {
        permalink_url: permalink.to_string(),
        author_name: "Author".to_string(),
        body_text: "an interesting post".to_string(),
        quoted_text: Some("the quoted post".to_string()),
        created_at: Utc::now() - chrono::Duration::minutes(5),
        metrics: EngagementMetrics {
            like_count: 100,
            repost_count: 10,
            reply_count: 2,
            view_count: 5000,
        },
        score: 126,
    }
}

#[tokio::test]
async fn http_sink_submits_into_the_ingestion_boundary() {
    let store = Arc::new(MemoryReplyStore::new());
    let endpoint = serve(store.clone(), 100).await;

    let sink = HttpSink::new(&endpoint);
    sink.submit(&candidate("https://x.com/a/status/1"))
        .await
        .unwrap();

    let record = store
        .find_by_permalink("https://x.com/a/status/1")
        .await
        .unwrap()
        .unwrap();
    // The boundary recomputed the same score from the raw metrics.
    assert_eq!(record.score, 126);
    assert_eq!(record.status, ReplyStatus::Pending);
    assert_eq!(record.quoted_text.as_deref(), Some("the quoted post"));
    assert_eq!(record.metrics.view_count, 5000);
}

#[tokio::test]
async fn http_sink_surfaces_rejection_responses_as_errors() {
    let store = Arc::new(MemoryReplyStore::new());
    let endpoint = serve(store.clone(), 100).await;

    let sink = HttpSink::new(&endpoint);
    let mut bad = candidate("https://x.com/a/status/2");
    bad.body_text = String::new();

    let result = sink.submit(&bad).await;
    assert!(result.is_err());
    assert!(store.list().await.unwrap().is_empty());
}
