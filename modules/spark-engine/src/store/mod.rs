// The record store boundary.
//
// The document store itself is an external collaborator; everything the
// pipeline needs from it sits behind ReplyStore. The conditional
// `transition` is the store-side half of the at-most-one-processing
// guarantee: the orchestrator's terminal writes all go through it.

mod memory;

pub use memory::MemoryReplyStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use spark_common::types::{ReplyRecord, ReplyStatus, Topic};
use spark_common::SparkError;

/// Partial update for a reply record. Only set fields are written;
/// `updated_at` is stamped by the store on every write.
#[derive(Debug, Clone, Default)]
pub struct ReplyPatch {
    pub status: Option<ReplyStatus>,
    pub topic: Option<Topic>,
    pub suggestions: Option<Vec<String>>,
    pub used_model: Option<String>,
    pub used_credential_index: Option<usize>,
    pub error_message: Option<String>,
}

impl ReplyPatch {
    pub fn status(status: ReplyStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, record: &mut ReplyRecord, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(topic) = self.topic {
            record.topic = Some(topic);
        }
        if let Some(suggestions) = self.suggestions {
            record.suggestions = suggestions;
        }
        if let Some(used_model) = self.used_model {
            record.used_model = Some(used_model);
        }
        if let Some(index) = self.used_credential_index {
            record.used_credential_index = Some(index);
        }
        if let Some(message) = self.error_message {
            record.error_message = Some(message);
        }
        record.updated_at = now;
    }
}

#[async_trait]
pub trait ReplyStore: Send + Sync {
    // --- Writes ---

    /// Insert a new record. Emits a creation event for `pending` records.
    async fn create(&self, record: ReplyRecord) -> Result<Uuid, SparkError>;

    /// Unconditional partial update.
    async fn update(&self, id: Uuid, patch: ReplyPatch) -> Result<(), SparkError>;

    /// Conditional update: applies `patch` only while the record's status is
    /// still `from`. Returns whether it applied. A patch whose target status
    /// is not reachable from `from` is an error.
    async fn transition(
        &self,
        id: Uuid,
        from: ReplyStatus,
        patch: ReplyPatch,
    ) -> Result<bool, SparkError>;

    async fn delete(&self, id: Uuid) -> Result<(), SparkError>;

    // --- Reads ---

    async fn get(&self, id: Uuid) -> Result<Option<ReplyRecord>, SparkError>;

    async fn find_by_permalink(&self, permalink_url: &str)
        -> Result<Option<ReplyRecord>, SparkError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ReplyRecord>, SparkError>;

    // --- Change subscription ---

    /// Ids of newly created `pending` records, in creation order.
    fn watch_created(&self) -> broadcast::Receiver<Uuid>;
}
