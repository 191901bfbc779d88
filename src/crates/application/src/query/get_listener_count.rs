use crate::query::aggregator::{self, SongIndex};
use crate::query::shared::{load_subject_songs, trailing_window};
use crate::query::QueryError;
use crate::shared::Clock;
use chrono::Duration;
use domain::song::SongCatalog;
use domain::value::Subject;
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository, TimeWindow};
use std::sync::Arc;

/// 主体在最近一段时间内的听众数与播放次数
#[derive(Clone)]
pub struct GetListenerCount {
    playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
    song_catalog: Arc<dyn SongCatalog>,
    clock: Arc<dyn Clock>,
}

impl GetListenerCount {
    pub fn new(
        playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
        song_catalog: Arc<dyn SongCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            playback_history_repository,
            song_catalog,
            clock,
        }
    }

    /// 窗口内不同用户数
    pub async fn handle(&self, subject: &Subject, window: Duration) -> Result<i64, QueryError> {
        let (songs, records, window) = self.load(subject, window).await?;
        Ok(aggregator::listener_count(&records, &songs, subject, &window))
    }

    /// 窗口内总播放次数
    pub async fn play_count(&self, subject: &Subject, window: Duration) -> Result<i64, QueryError> {
        let (songs, records, window) = self.load(subject, window).await?;
        Ok(aggregator::play_count(&records, &songs, subject, &window))
    }

    async fn load(
        &self,
        subject: &Subject,
        window: Duration,
    ) -> Result<(SongIndex, Vec<HistoryRecord>, TimeWindow), QueryError> {
        let window = trailing_window(self.clock.as_ref(), window)?;
        // 只取属于该主体的歌曲的记录
        let (songs, song_ids) = load_subject_songs(self.song_catalog.as_ref(), subject).await?;
        let filter = HistoryFilter::within(window).for_songs(song_ids);
        let records = self.playback_history_repository.query(&filter).await?;
        Ok((songs, records, window))
    }
}
