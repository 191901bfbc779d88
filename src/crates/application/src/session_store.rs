use crate::error::AppError;
use dashmap::DashMap;
use domain::playback_session::{PlaybackSession, PlaybackSessionRepository};
use domain::value::UserId;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 持有会话锁期间对会话的独占访问
pub type SessionGuard = OwnedMutexGuard<PlaybackSession>;

/// 每个用户一个播放会话。
///
/// 同一用户的修改经由各自的 `Mutex` 串行化；`DashMap` 分片，不同用户之间没有
/// 共享锁。配置了仓储时，冷启动先从仓储加载，每次修改之后写回。
pub struct SessionStore {
    sessions: DashMap<UserId, Arc<Mutex<PlaybackSession>>>,
    repository: Option<Arc<dyn PlaybackSessionRepository>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            repository: None,
        }
    }

    pub fn with_repository(repository: Arc<dyn PlaybackSessionRepository>) -> Self {
        Self {
            sessions: DashMap::new(),
            repository: Some(repository),
        }
    }

    /// 返回已有会话，或创建（加载）一个空闲会话
    pub async fn get_or_create(
        &self,
        user_id: &UserId,
    ) -> Result<Arc<Mutex<PlaybackSession>>, AppError> {
        if let Some(entry) = self.sessions.get(user_id) {
            return Ok(entry.value().clone());
        }

        let loaded = match &self.repository {
            Some(repository) => repository.find_by_user(user_id).await?,
            None => None,
        };
        let session = match loaded {
            Some(session) => {
                debug!("Loaded persisted session for user {}", user_id);
                session
            }
            None => PlaybackSession::new(user_id.clone()),
        };

        // 并发的冷加载只保留先插入的那一个
        let entry = self
            .sessions
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        Ok(entry.value().clone())
    }

    /// 获取用户会话的独占锁
    pub async fn lock(&self, user_id: &UserId) -> Result<SessionGuard, AppError> {
        let cell = self.get_or_create(user_id).await?;
        Ok(cell.lock_owned().await)
    }

    /// 会话的当前快照
    pub async fn snapshot(&self, user_id: &UserId) -> Result<PlaybackSession, AppError> {
        let guard = self.lock(user_id).await?;
        Ok(guard.clone())
    }

    /// 写回仓储；未配置仓储时什么也不做
    pub async fn persist(&self, session: &PlaybackSession) -> Result<(), AppError> {
        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(session).await {
                warn!("Failed to persist session of user {}: {}", session.user_id, e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{t, MemorySessions};
    use domain::playback_session::PlaybackState;
    use domain::song::SongRef;
    use domain::value::SongId;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sessions_are_created_lazily_and_reused() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let first = store.get_or_create(&UserId::from(1)).await.unwrap();
        let again = store.get_or_create(&UserId::from(1)).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.lock().await.state(), PlaybackState::Idle);

        store.get_or_create(&UserId::from(2)).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_same_user_is_serialized_other_users_are_not() {
        let store = Arc::new(SessionStore::new());
        let guard = store.lock(&UserId::from(1)).await.unwrap();

        // 同一用户在锁释放前拿不到
        let blocked = tokio::time::timeout(Duration::from_millis(50), store.lock(&UserId::from(1))).await;
        assert!(blocked.is_err());

        // 其他用户不受影响
        let other = tokio::time::timeout(Duration::from_millis(50), store.lock(&UserId::from(2))).await;
        assert!(other.is_ok());

        drop(guard);
        assert!(store.lock(&UserId::from(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_cold_miss_loads_persisted_session() {
        let repository = Arc::new(MemorySessions::default());
        let mut persisted = PlaybackSession::new(UserId::from(5));
        persisted.play(SongRef::new(SongId::from(3), 180), t(0));
        persisted.pop_events();
        repository.save(&persisted).await.unwrap();

        let store = SessionStore::with_repository(repository.clone());
        let session = store.snapshot(&UserId::from(5)).await.unwrap();
        assert_eq!(session.current_song_id(), Some(&SongId::from(3)));
        assert_eq!(session.state(), PlaybackState::Playing);

        store.persist(&session).await.unwrap();
        assert_eq!(repository.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persist_failure_is_store_unavailable() {
        let repository = Arc::new(MemorySessions::default());
        repository.fail_saves.store(true, Ordering::SeqCst);
        let store = SessionStore::with_repository(repository);

        let session = store.snapshot(&UserId::from(1)).await.unwrap();
        let err = store.persist(&session).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
