use crate::query::aggregator;
use crate::query::shared::{
    load_catalog_and_history, load_subject_songs, trailing_window, MAX_LIMIT,
};
use crate::query::QueryError;
use crate::shared::Clock;
use chrono::Duration;
use domain::song::SongCatalog;
use domain::value::Subject;
use model::analytics::{GenreTopSongs, TopSong};
use model::playback_history::{HistoryFilter, PlaybackHistoryRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct GetTopSongs {
    playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
    song_catalog: Arc<dyn SongCatalog>,
    clock: Arc<dyn Clock>,
}

impl GetTopSongs {
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

    /// 最近一段时间播放最多的歌曲。
    /// 指定流派时只在该流派内排名，否则在全部歌曲中排名。
    pub async fn handle(
        &self,
        window: Duration,
        limit: usize,
        genre: Option<&str>,
    ) -> Result<Vec<TopSong>, QueryError> {
        let limit = limit.min(MAX_LIMIT); // 限制最大值为 500
        let window = trailing_window(self.clock.as_ref(), window)?;
        let filter = HistoryFilter::within(window);
        match genre {
            None => {
                let records = self.playback_history_repository.query(&filter).await?;
                Ok(aggregator::top_songs_overall(&records, &window, limit))
            }
            Some(genre) => {
                let subject = Subject::Genre(genre.to_string());
                let songs = self.song_catalog.find_by_subject(&subject).await?;
                // 未知流派返回空列表
                if songs.is_empty() {
                    return Ok(Vec::new());
                }
                let song_ids = songs.iter().map(|song| song.id.clone()).collect();
                let records = self
                    .playback_history_repository
                    .query(&filter.for_songs(song_ids))
                    .await?;
                Ok(aggregator::subject_top_songs(
                    &records,
                    &aggregator::index_songs(songs),
                    &subject,
                    &window,
                    limit,
                ))
            }
        }
    }

    /// 按流派分组的排行，每个流派最多 `limit` 首
    pub async fn by_genre(
        &self,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<GenreTopSongs>, QueryError> {
        let limit = limit.min(MAX_LIMIT);
        let window = trailing_window(self.clock.as_ref(), window)?;
        let (songs, records) = load_catalog_and_history(
            self.song_catalog.as_ref(),
            self.playback_history_repository.as_ref(),
            &HistoryFilter::within(window),
        )
        .await?;
        Ok(aggregator::top_songs(&records, &songs, &window, limit))
    }

    /// 某个艺术家（或专辑、流派）的热门歌曲
    pub async fn for_subject(
        &self,
        subject: &Subject,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<TopSong>, QueryError> {
        let limit = limit.min(MAX_LIMIT);
        let window = trailing_window(self.clock.as_ref(), window)?;
        let (songs, song_ids) = load_subject_songs(self.song_catalog.as_ref(), subject).await?;
        let records = self
            .playback_history_repository
            .query(&HistoryFilter::within(window).for_songs(song_ids))
            .await?;
        Ok(aggregator::subject_top_songs(
            &records, &songs, subject, &window, limit,
        ))
    }
}
