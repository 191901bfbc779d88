use crate::query::QueryError;
use crate::session_store::SessionStore;
use crate::shared::Clock;
use domain::playback_session::PlaybackState;
use domain::value::{SongId, UserId};
use std::sync::Arc;

/// 会话的只读视图
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub song_id: Option<SongId>,
    pub progress_seconds: i64,
    pub is_paused: bool,
    pub state: PlaybackState,
}

#[derive(Clone)]
pub struct GetSessionView {
    sessions: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
}

impl GetSessionView {
    pub fn new(sessions: Arc<SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// 没有会话的用户得到一个空闲视图
    pub async fn handle(&self, user_id: i64) -> Result<SessionView, QueryError> {
        let session = self.sessions.snapshot(&UserId::from(user_id)).await?;
        let now = self.clock.now();
        Ok(SessionView {
            song_id: session.current_song_id().cloned(),
            progress_seconds: session.current_progress(now),
            is_paused: session.is_paused,
            state: session.state(),
        })
    }
}
