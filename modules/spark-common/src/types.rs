use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Engagement ---

/// Counts parsed from a feed item's action controls. Unparseable values
/// degrade to 0, never to an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngagementMetrics {
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
    pub view_count: u64,
}

// --- Candidate ---

/// A scored, transient extraction result eligible for dispatch. Identity is
/// `permalink_url`; candidates are deduplicated by it within one scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub permalink_url: String,
    pub author_name: String,
    pub body_text: String,
    pub quoted_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub metrics: EngagementMetrics,
    pub score: i64,
}

// --- Topic ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Topic {
    PoliticsEconomics,
    Stocks,
    Math,
    Education,
    IndieDev,
    SaaS,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::PoliticsEconomics => write!(f, "PoliticsEconomics"),
            Topic::Stocks => write!(f, "Stocks"),
            Topic::Math => write!(f, "Math"),
            Topic::Education => write!(f, "Education"),
            Topic::IndieDev => write!(f, "IndieDev"),
            Topic::SaaS => write!(f, "SaaS"),
        }
    }
}

impl Topic {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim() {
            "PoliticsEconomics" => Some(Topic::PoliticsEconomics),
            "Stocks" => Some(Topic::Stocks),
            "Math" => Some(Topic::Math),
            "Education" => Some(Topic::Education),
            "IndieDev" => Some(Topic::IndieDev),
            "SaaS" => Some(Topic::SaaS),
            _ => None,
        }
    }

    /// Placeholder used when a record is rejected before any generation runs.
    pub fn placeholder() -> Self {
        Topic::SaaS
    }
}

// --- Reply lifecycle ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Pending,
    Generated,
    Rejected,
    Error,
    Posted,
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyStatus::Pending => write!(f, "pending"),
            ReplyStatus::Generated => write!(f, "generated"),
            ReplyStatus::Rejected => write!(f, "rejected"),
            ReplyStatus::Error => write!(f, "error"),
            ReplyStatus::Posted => write!(f, "posted"),
        }
    }
}

impl ReplyStatus {
    /// One-way lifecycle: `pending` resolves exactly once, and only a
    /// `generated` record can be marked `posted`. Everything else is final.
    pub fn can_transition_to(self, next: ReplyStatus) -> bool {
        matches!(
            (self, next),
            (ReplyStatus::Pending, ReplyStatus::Generated)
                | (ReplyStatus::Pending, ReplyStatus::Rejected)
                | (ReplyStatus::Pending, ReplyStatus::Error)
                | (ReplyStatus::Generated, ReplyStatus::Posted)
        )
    }
}

// --- Reply record ---

/// The persisted, stateful unit tracked through the generation pipeline.
/// Created `pending` by the ingestion boundary, resolved exactly once by the
/// orchestrator, deleted only by explicit user action or permalink
/// re-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: Uuid,
    pub permalink_url: String,
    pub author_name: String,
    pub body_text: String,
    pub quoted_text: Option<String>,
    pub metrics: EngagementMetrics,
    pub score: i64,
    pub status: ReplyStatus,
    pub topic: Option<Topic>,
    pub suggestions: Vec<String>,
    pub used_model: Option<String>,
    pub used_credential_index: Option<usize>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the source post itself was published.
    pub source_created_at: DateTime<Utc>,
}

impl ReplyRecord {
    /// Build a fresh record from an accepted candidate payload.
    pub fn from_candidate(candidate: &Candidate, status: ReplyStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            permalink_url: candidate.permalink_url.clone(),
            author_name: candidate.author_name.clone(),
            body_text: candidate.body_text.clone(),
            quoted_text: candidate.quoted_text.clone(),
            metrics: candidate.metrics,
            score: candidate.score,
            status,
            topic: None,
            suggestions: Vec::new(),
            used_model: None,
            used_credential_index: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            source_created_at: candidate.created_at,
        }
    }
}
