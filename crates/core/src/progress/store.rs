use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{ProgressRecord, Stage};

/// Shared map from task id to progress record.
///
/// Cloning is cheap; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    records: Arc<RwLock<HashMap<String, ProgressRecord>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites the record for `task_id`.
    pub async fn set(&self, task_id: &str, mut record: ProgressRecord) {
        record.updated_at = Utc::now();
        self.records
            .write()
            .await
            .insert(task_id.to_string(), record);
    }

    /// Moves a task into `stage`. Percent never goes down.
    pub async fn advance(&self, task_id: &str, stage: Stage) {
        let mut records = self.records.write().await;
        let mut record = ProgressRecord::at_stage(stage);
        if let Some(previous) = records.get(task_id) {
            record.percent = record.percent.max(previous.percent);
        }
        debug!(task_id, stage = %stage, percent = record.percent, "Task progress");
        records.insert(task_id.to_string(), record);
    }

    /// Marks a task failed, keeping the last percent reached.
    pub async fn fail(&self, task_id: &str, message: impl Into<String>) {
        let mut records = self.records.write().await;
        let percent = records.get(task_id).map(|r| r.percent).unwrap_or(0);
        records.insert(
            task_id.to_string(),
            ProgressRecord {
                percent,
                message: message.into(),
                stage: Stage::Failed,
                updated_at: Utc::now(),
            },
        );
    }

    /// Current record, or the "preparing" record for unknown ids.
    pub async fn get(&self, task_id: &str) -> ProgressRecord {
        self.records
            .read()
            .await
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes finished records last updated more than `ttl` ago.
    pub async fn evict_finished(&self, ttl: Duration) -> usize {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.evict_finished_before(cutoff).await
    }

    /// Removes finished records last updated before `cutoff`.
    pub async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.stage.is_terminal() && r.updated_at < cutoff));
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "Evicted finished progress records");
        }
        removed
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of tracked tasks per stage.
    pub async fn counts_by_stage(&self) -> HashMap<Stage, usize> {
        let records = self.records.read().await;
        let mut counts = HashMap::new();
        for record in records.values() {
            *counts.entry(record.stage).or_insert(0) += 1;
        }
        counts
    }
}
