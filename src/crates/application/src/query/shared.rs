use crate::query::aggregator::{self, SongIndex};
use crate::query::QueryError;
use crate::shared::Clock;
use chrono::Duration;
use domain::song::SongCatalog;
use domain::value::{SongId, Subject};
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository, TimeWindow};

/// 单次查询返回的最大条数
pub const MAX_LIMIT: usize = 500;

/// 以当前时间为终点的窗口
pub fn trailing_window(clock: &dyn Clock, length: Duration) -> Result<TimeWindow, QueryError> {
    if length < Duration::zero() {
        return Err(QueryError::InvalidParameter(format!(
            "window must not be negative: {}s",
            length.num_seconds()
        )));
    }
    TimeWindow::trailing(clock.now(), length).ok_or_else(|| {
        QueryError::InvalidParameter(format!("window too large: {}s", length.num_seconds()))
    })
}

/// 同时加载歌曲目录和满足条件的历史记录
pub async fn load_catalog_and_history(
    catalog: &dyn SongCatalog,
    history: &dyn PlaybackHistoryRepository,
    filter: &HistoryFilter,
) -> Result<(SongIndex, Vec<HistoryRecord>), QueryError> {
    let (songs, records) = futures::try_join!(
        async { catalog.all().await.map_err(QueryError::from) },
        async { history.query(filter).await.map_err(QueryError::from) },
    )?;
    Ok((aggregator::index_songs(songs), records))
}

/// 只加载属于主体的歌曲，返回索引和按 id 排序的歌曲 id；
/// 目录中没有这个主体时返回 NotFound
pub async fn load_subject_songs(
    catalog: &dyn SongCatalog,
    subject: &Subject,
) -> Result<(SongIndex, Vec<SongId>), QueryError> {
    let songs = catalog.find_by_subject(subject).await?;
    if songs.is_empty() {
        return Err(QueryError::NotFound(subject.to_string()));
    }
    let mut ids: Vec<SongId> = songs.iter().map(|song| song.id.clone()).collect();
    ids.sort();
    Ok((aggregator::index_songs(songs), ids))
}
