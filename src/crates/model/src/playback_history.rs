use crate::ModelError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain::value::{SongId, UserId};

/// An immutable entry in a listener's history: one qualifying listen.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub user_id: UserId,
    pub song_id: SongId,
    pub played_at: DateTime<Utc>,
    pub listened_seconds: i64,
}

/// Closed interval `[start, end]` of wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now - length, now]`; `None` when the start would fall outside the
    /// representable range.
    pub fn trailing(now: DateTime<Utc>, length: Duration) -> Option<Self> {
        now.checked_sub_signed(length).map(|start| Self { start, end: now })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub user_id: Option<UserId>,
    pub song_ids: Option<Vec<SongId>>,
    pub window: Option<TimeWindow>,
}

impl HistoryFilter {
    pub fn within(window: TimeWindow) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn for_songs(mut self, song_ids: Vec<SongId>) -> Self {
        self.song_ids = Some(song_ids);
        self
    }

    pub fn matches(&self, record: &HistoryRecord) -> bool {
        if let Some(user_id) = &self.user_id {
            if &record.user_id != user_id {
                return false;
            }
        }
        if let Some(song_ids) = &self.song_ids {
            if !song_ids.contains(&record.song_id) {
                return false;
            }
        }
        match &self.window {
            Some(window) => window.contains(record.played_at),
            None => true,
        }
    }
}

/// Append-only store of history records.
///
/// `query` returns matching records ordered by `played_at` ascending.
#[async_trait]
pub trait PlaybackHistoryRepository: Send + Sync {
    async fn append(&self, record: &HistoryRecord) -> Result<(), ModelError>;
    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, ModelError>;
}
