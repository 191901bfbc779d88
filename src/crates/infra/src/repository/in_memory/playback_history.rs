use async_trait::async_trait;
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository};
use model::ModelError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 只追加的内存播放历史
#[derive(Clone, Default)]
pub struct InMemoryPlaybackHistoryRepository {
    records: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl InMemoryPlaybackHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PlaybackHistoryRepository for InMemoryPlaybackHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<(), ModelError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, ModelError> {
        let mut rows: Vec<HistoryRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // 稳定排序，同一时间的记录保持写入顺序
        rows.sort_by_key(|r| r.played_at);
        Ok(rows)
    }
}
