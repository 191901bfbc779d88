//! Test doubles shared by the unit tests of this crate.

use crate::error::AppError;
use crate::event::event_bus::{EventBus, EventEnvelope, Handler};
use crate::shared::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::playback_session::{PlaybackError, PlaybackSession, PlaybackSessionRepository};
use domain::song::{Song, SongCatalog, SongError};
use domain::value::{AlbumId, ArtistId, SongId, Subject, UserId};
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository};
use model::ModelError;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn song(id: i64, duration: i64, genre: &str, artist: i64, album: Option<i64>) -> Song {
    Song::new(
        SongId::from(id),
        duration,
        genre,
        ArtistId::from(artist),
        album.map(AlbumId::from),
    )
}

pub fn record(user: i64, song: i64, at: i64) -> HistoryRecord {
    HistoryRecord {
        user_id: UserId::from(user),
        song_id: SongId::from(song),
        played_at: t(at),
        listened_seconds: 60,
    }
}

pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn at(secs: i64) -> Self {
        Self {
            now: Mutex::new(t(secs)),
        }
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now = *now + Duration::seconds(secs);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<HistoryRecord>>,
    pub offline: AtomicBool,
}

impl InMemoryHistory {
    pub fn failing() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            offline: AtomicBool::new(true),
        }
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            offline: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ModelError::DbErr("history store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaybackHistoryRepository for InMemoryHistory {
    async fn append(&self, record: &HistoryRecord) -> Result<(), ModelError> {
        self.check()?;
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, ModelError> {
        self.check()?;
        let mut records: Vec<HistoryRecord> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.played_at);
        Ok(records)
    }
}

pub struct StaticCatalog {
    songs: Vec<Song>,
}

impl StaticCatalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self { songs }
    }
}

#[async_trait]
impl SongCatalog for StaticCatalog {
    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>, SongError> {
        Ok(self.songs.iter().find(|s| &s.id == id).cloned())
    }

    async fn all(&self) -> Result<Vec<Song>, SongError> {
        Ok(self.songs.clone())
    }

    async fn find_by_subject(&self, subject: &Subject) -> Result<Vec<Song>, SongError> {
        let mut songs: Vec<Song> = self
            .songs
            .iter()
            .filter(|s| s.belongs_to(subject))
            .cloned()
            .collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(songs)
    }
}

#[derive(Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<UserId, PlaybackSession>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

#[async_trait]
impl PlaybackSessionRepository for MemorySessions {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<PlaybackSession>, PlaybackError> {
        Ok(self.sessions.lock().unwrap().get(user_id).cloned())
    }

    async fn save(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PlaybackError::StoreErr("session store offline".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }
}

/// Minimal synchronous bus: handlers run in subscription order.
#[derive(Default)]
pub struct TestBus {
    handlers: Vec<Box<dyn Any + Send + Sync>>,
    pub published: AtomicUsize,
}

#[async_trait]
impl EventBus for TestBus {
    async fn publish<E>(&self, event: EventEnvelope<E>) -> Result<(), AppError>
    where
        E: Send + Sync + 'static,
    {
        self.published.fetch_add(1, Ordering::SeqCst);
        for handler in &self.handlers {
            if let Some(handler) = (**handler).downcast_ref::<Arc<dyn Handler<E>>>() {
                handler.handle(&event).await?;
            }
        }
        Ok(())
    }

    async fn subscribe<E>(&mut self, handler: Arc<dyn Handler<E>>)
    where
        E: Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }
}
