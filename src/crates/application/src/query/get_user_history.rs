use crate::query::shared::{trailing_window, MAX_LIMIT};
use crate::query::QueryError;
use crate::shared::Clock;
use chrono::Duration;
use domain::value::UserId;
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository};
use std::sync::Arc;

/// 分页后的播放历史
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// 窗口内的记录总数
    pub total: usize,
    pub records: Vec<HistoryRecord>,
}

/// 用户最近播放的歌曲，最新的在前
#[derive(Clone)]
pub struct GetUserHistory {
    playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
    clock: Arc<dyn Clock>,
}

impl GetUserHistory {
    pub fn new(
        playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            playback_history_repository,
            clock,
        }
    }

    pub async fn handle(
        &self,
        user_id: i64,
        window: Duration,
        offset: usize,
        limit: usize,
    ) -> Result<HistoryPage, QueryError> {
        let limit = limit.min(MAX_LIMIT);
        let window = trailing_window(self.clock.as_ref(), window)?;
        let filter = HistoryFilter::within(window).for_user(UserId::from(user_id));
        let mut records = self.playback_history_repository.query(&filter).await?;

        let total = records.len();
        records.reverse();
        let records = records.into_iter().skip(offset).take(limit).collect();
        Ok(HistoryPage { total, records })
    }
}
