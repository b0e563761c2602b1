use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use spark_common::types::Candidate;

// --- CandidateSink trait ---

/// Where ranked candidates go after a scan. The HTTP implementation talks to
/// the ingestion boundary; tests record submissions in memory.
#[async_trait]
pub trait CandidateSink: Send + Sync {
    async fn submit(&self, candidate: &Candidate) -> Result<()>;
}

// --- Ingestion payload ---

/// Wire payload for the ingestion boundary. Carries the raw observation
/// only; the boundary computes the score and gate-eligibility itself.
#[derive(Debug, Serialize)]
pub struct CandidatePayload<'a> {
    pub permalink_url: &'a str,
    pub body_text: &'a str,
    pub author_name: &'a str,
    pub quoted_text: Option<&'a str>,
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
    pub view_count: u64,
    pub source_created_at: DateTime<Utc>,
}

impl<'a> From<&'a Candidate> for CandidatePayload<'a> {
    fn from(candidate: &'a Candidate) -> Self {
        Self {
            permalink_url: &candidate.permalink_url,
            body_text: &candidate.body_text,
            author_name: &candidate.author_name,
            quoted_text: candidate.quoted_text.as_deref(),
            like_count: candidate.metrics.like_count,
            repost_count: candidate.metrics.repost_count,
            reply_count: candidate.metrics.reply_count,
            view_count: candidate.metrics.view_count,
            source_created_at: candidate.created_at,
        }
    }
}

// --- HTTP sink ---

pub struct HttpSink {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl CandidateSink for HttpSink {
    async fn submit(&self, candidate: &Candidate) -> Result<()> {
        let payload = CandidatePayload::from(candidate);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("Ingestion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ingestion rejected candidate ({status}): {body}");
        }

        info!(
            permalink = candidate.permalink_url.as_str(),
            score = candidate.score,
            "Candidate submitted"
        );
        Ok(())
    }
}
