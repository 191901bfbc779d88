use crate::query::aggregator;
use crate::query::shared::{load_catalog_and_history, trailing_window};
use crate::query::QueryError;
use crate::shared::Clock;
use chrono::Duration;
use domain::song::SongCatalog;
use domain::value::Subject;
use model::playback_history::{HistoryFilter, PlaybackHistoryRepository};
use std::sync::Arc;

/// 主体在同类主体中按听众数的排名
#[derive(Clone)]
pub struct GetPopularityRank {
    playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
    song_catalog: Arc<dyn SongCatalog>,
    clock: Arc<dyn Clock>,
}

impl GetPopularityRank {
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

    pub async fn handle(&self, subject: &Subject, window: Duration) -> Result<usize, QueryError> {
        let window = trailing_window(self.clock.as_ref(), window)?;
        let (songs, records) = load_catalog_and_history(
            self.song_catalog.as_ref(),
            self.playback_history_repository.as_ref(),
            &HistoryFilter::within(window),
        )
        .await?;
        aggregator::popularity_rank(&records, &songs, subject, &window)
            .ok_or_else(|| QueryError::NotFound(subject.to_string()))
    }
}
