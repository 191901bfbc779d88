use crate::error::AppError;
use chrono::{DateTime, Utc};
use domain::song::SongRef;
use domain::value::UserId;
use log::{debug, info};
use model::playback_history::{HistoryRecord, PlaybackHistoryRepository};
use std::sync::Arc;

/// 判定一次收听是否计为“播放”的规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenPolicy {
    pub min_listen_seconds: i64,
    pub min_listen_ratio: f64,
}

impl Default for ListenPolicy {
    fn default() -> Self {
        Self {
            min_listen_seconds: 30,
            min_listen_ratio: 0.5,
        }
    }
}

impl ListenPolicy {
    pub fn new(min_listen_seconds: i64, min_listen_ratio: f64) -> Self {
        Self {
            min_listen_seconds: min_listen_seconds.max(0),
            min_listen_ratio: min_listen_ratio.clamp(0.0, 1.0),
        }
    }

    /// `min(min_listen_seconds, ratio * duration)`
    pub fn threshold_seconds(&self, duration_seconds: i64) -> f64 {
        let by_ratio = self.min_listen_ratio * duration_seconds.max(0) as f64;
        (self.min_listen_seconds as f64).min(by_ratio)
    }

    pub fn qualifies(&self, listened_seconds: i64, duration_seconds: i64) -> bool {
        // 零时长或零收听永远不算
        listened_seconds > 0 && listened_seconds as f64 >= self.threshold_seconds(duration_seconds)
    }
}

/// 把合格的收听写入播放历史
pub struct HistoryRecorder {
    repository: Arc<dyn PlaybackHistoryRepository>,
    policy: ListenPolicy,
}

impl HistoryRecorder {
    pub fn new(repository: Arc<dyn PlaybackHistoryRepository>, policy: ListenPolicy) -> Self {
        Self { repository, policy }
    }

    /// 处理一次收听结束。合格时追加一条记录并返回它。
    pub async fn on_listen_finalized(
        &self,
        user_id: &UserId,
        song: &SongRef,
        listened_seconds: i64,
        finalized_at: DateTime<Utc>,
    ) -> Result<Option<HistoryRecord>, AppError> {
        if !self.policy.qualifies(listened_seconds, song.duration_seconds) {
            debug!(
                "Listen of song {} by user {} not recorded: {}s of {}s",
                song.id, user_id, listened_seconds, song.duration_seconds
            );
            return Ok(None);
        }
        let record = HistoryRecord {
            user_id: user_id.clone(),
            song_id: song.id.clone(),
            played_at: finalized_at,
            listened_seconds,
        };
        self.repository.append(&record).await?;
        info!(
            "Recorded play of song {} by user {} ({}s)",
            record.song_id, record.user_id, record.listened_seconds
        );
        Ok(Some(record))
    }
}
