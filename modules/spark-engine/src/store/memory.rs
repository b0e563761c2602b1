use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use spark_common::types::{ReplyRecord, ReplyStatus};
use spark_common::SparkError;

use super::{ReplyPatch, ReplyStore};

/// In-memory reference implementation of the record store. All mutations go
/// through one RwLock, which is what makes `transition` an atomic
/// compare-and-set here.
pub struct MemoryReplyStore {
    records: RwLock<HashMap<Uuid, ReplyRecord>>,
    created_tx: broadcast::Sender<Uuid>,
}

impl MemoryReplyStore {
    pub fn new() -> Self {
        let (created_tx, _) = broadcast::channel(256);
        Self {
            records: RwLock::new(HashMap::new()),
            created_tx,
        }
    }
}

impl Default for MemoryReplyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyStore for MemoryReplyStore {
    async fn create(&self, record: ReplyRecord) -> Result<Uuid, SparkError> {
        let id = record.id;
        let status = record.status;
        self.records.write().await.insert(id, record);
        if status == ReplyStatus::Pending {
            // No receivers yet is fine; the event is only a wake-up.
            let _ = self.created_tx.send(id);
        }
        debug!(%id, %status, "Record created");
        Ok(id)
    }

    async fn update(&self, id: Uuid, patch: ReplyPatch) -> Result<(), SparkError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| SparkError::NotFound(id.to_string()))?;
        patch.apply(record, Utc::now());
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: ReplyStatus,
        patch: ReplyPatch,
    ) -> Result<bool, SparkError> {
        let next = patch.status.ok_or_else(|| {
            SparkError::InvalidTransition("transition patch must set a status".to_string())
        })?;
        if !from.can_transition_to(next) {
            return Err(SparkError::InvalidTransition(format!("{from} -> {next}")));
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| SparkError::NotFound(id.to_string()))?;
        if record.status != from {
            return Ok(false);
        }
        patch.apply(record, Utc::now());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SparkError> {
        self.records.write().await.remove(&id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReplyRecord>, SparkError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_permalink(
        &self,
        permalink_url: &str,
    ) -> Result<Option<ReplyRecord>, SparkError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.permalink_url == permalink_url)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<ReplyRecord>, SparkError> {
        let mut records: Vec<ReplyRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn watch_created(&self) -> broadcast::Receiver<Uuid> {
        self.created_tx.subscribe()
    }
}
