use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::playback_session::{PlaybackError, PlaybackSession, PlaybackSessionRepository};
use domain::song::SongRef;
use domain::value::{SongId, UserId};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::PathBuf;

/// 会话快照（以 JSON 存储在 sled 中）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionSnapshot {
    user_id: i64,
    song_id: Option<i64>,
    duration_seconds: Option<i64>,
    started_at: Option<DateTime<Utc>>,
    progress_seconds: i64,
    paused_at: Option<DateTime<Utc>>,
    is_paused: bool,
    version: i64,
}

impl From<&PlaybackSession> for SessionSnapshot {
    fn from(session: &PlaybackSession) -> Self {
        Self {
            user_id: session.user_id.as_i64(),
            song_id: session.song.as_ref().map(|s| s.id.as_i64()),
            duration_seconds: session.song.as_ref().map(|s| s.duration_seconds),
            started_at: session.started_at,
            progress_seconds: session.progress_seconds,
            paused_at: session.paused_at,
            is_paused: session.is_paused,
            version: session.version,
        }
    }
}

impl From<SessionSnapshot> for PlaybackSession {
    fn from(snapshot: SessionSnapshot) -> Self {
        let song = match (snapshot.song_id, snapshot.duration_seconds) {
            (Some(id), Some(duration)) => Some(SongRef::new(SongId::from(id), duration)),
            _ => None,
        };
        PlaybackSession::restore(
            UserId::from(snapshot.user_id),
            song,
            snapshot.started_at,
            snapshot.progress_seconds,
            snapshot.paused_at,
            snapshot.is_paused,
            snapshot.version,
        )
    }
}

/// 基于 sled 的会话仓储，进程重启后会话可以恢复
pub struct SledPlaybackSessionRepository {
    /// sled 数据库实例
    db: Db,
}

impl SledPlaybackSessionRepository {
    /// 打开（或创建）会话数据库
    pub fn new(db_path: PathBuf) -> Result<Self, sled::Error> {
        let db = sled::open(db_path)?;
        Ok(Self { db })
    }

    fn key(user_id: &UserId) -> [u8; 8] {
        user_id.as_i64().to_be_bytes()
    }
}

fn store_err(e: impl std::fmt::Display) -> PlaybackError {
    PlaybackError::StoreErr(e.to_string())
}

#[async_trait]
impl PlaybackSessionRepository for SledPlaybackSessionRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PlaybackSession>, PlaybackError> {
        let Some(value) = self.db.get(Self::key(user_id)).map_err(store_err)? else {
            return Ok(None);
        };
        let snapshot: SessionSnapshot = serde_json::from_slice(&value).map_err(store_err)?;
        Ok(Some(snapshot.into()))
    }

    async fn save(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        let value = serde_json::to_vec(&SessionSnapshot::from(session)).map_err(store_err)?;
        self.db
            .insert(Self::key(&session.user_id), value)
            .map_err(store_err)?;
        self.db.flush_async().await.map_err(store_err)?;
        Ok(())
    }
}
