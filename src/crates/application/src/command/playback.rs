use std::sync::Arc;

use crate::context::AppContext;
use crate::error::AppError;
use crate::event::event_bus::EventBus;
use crate::session_store::SessionStore;
use crate::shared::Clock;
use domain::playback_session::{PlaybackEvent, PlaybackSession, PlaybackState};
use domain::song::{SongCatalog, SongRef};
use domain::value::{SongId, UserId};
use log::{debug, error, warn};

/// Inbound playback action
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackAction {
    Play { song_id: i64 },
    Pause,
    Resume,
    /// Target offset in seconds, clamped to the track bounds
    Seek { progress_seconds: i64 },
    /// Go idle, optionally starting another song right away
    Reset { song_id: Option<i64> },
    /// End-of-track signal from the transport
    Finish,
}

impl PlaybackAction {
    /// Build an action from its wire name and optional parameters.
    pub fn parse(
        action: &str,
        song_id: Option<i64>,
        progress_seconds: Option<i64>,
    ) -> Result<Self, AppError> {
        match action.trim().to_ascii_lowercase().as_str() {
            "play" => song_id
                .map(|song_id| PlaybackAction::Play { song_id })
                .ok_or_else(|| AppError::InvalidInput("play requires song_id".to_string())),
            "pause" => Ok(PlaybackAction::Pause),
            "resume" => Ok(PlaybackAction::Resume),
            "seek" => progress_seconds
                .map(|progress_seconds| PlaybackAction::Seek { progress_seconds })
                .ok_or_else(|| {
                    AppError::InvalidInput("seek requires progress_seconds".to_string())
                }),
            "reset" => Ok(PlaybackAction::Reset { song_id }),
            "finish" => Ok(PlaybackAction::Finish),
            other => Err(AppError::InvalidInput(format!(
                "unknown playback action: {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackAction::Play { .. } => "play",
            PlaybackAction::Pause => "pause",
            PlaybackAction::Resume => "resume",
            PlaybackAction::Seek { .. } => "seek",
            PlaybackAction::Reset { .. } => "reset",
            PlaybackAction::Finish => "finish",
        }
    }
}

/// Apply playback action command
#[derive(Debug)]
pub struct PlaybackCmd {
    pub user_id: i64,
    pub action: PlaybackAction,
}

/// Session state after an action
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub song_id: Option<SongId>,
    pub progress_seconds: i64,
}

impl PlaybackStatus {
    fn of(session: &PlaybackSession, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            state: session.state(),
            song_id: session.current_song_id().cloned(),
            progress_seconds: session.current_progress(now),
        }
    }
}

// 歌曲已经通过目录解析
enum ResolvedAction {
    Play(SongRef),
    Pause,
    Resume,
    Seek(i64),
    Reset(Option<SongRef>),
    Finish,
}

/// Playback application service
pub struct PlaybackService<B: EventBus> {
    sessions: Arc<SessionStore>,
    song_catalog: Arc<dyn SongCatalog>,
    clock: Arc<dyn Clock>,
    event_bus: Arc<B>,
}

impl<B: EventBus> PlaybackService<B> {
    pub fn new(
        sessions: Arc<SessionStore>,
        song_catalog: Arc<dyn SongCatalog>,
        clock: Arc<dyn Clock>,
        event_bus: Arc<B>,
    ) -> Self {
        Self {
            sessions,
            song_catalog,
            clock,
            event_bus,
        }
    }

    /// Apply one action to the user's session.
    ///
    /// The user's session lock is held across the transition, the write-through
    /// and event publication. If the write-through fails the events are still
    /// published and the store error is returned afterwards.
    ///
    /// Events a handler rejected stay queued on the session. They are
    /// delivered again before the next action is applied, and that action is
    /// refused while they still cannot be delivered.
    pub async fn apply_action(&self, cmd: PlaybackCmd) -> Result<PlaybackStatus, AppError> {
        let user_id = UserId::from(cmd.user_id);
        let resolved = self.resolve(&cmd.action).await?;

        let mut session = self.sessions.lock(&user_id).await?;
        if session.has_pending_events() {
            let backlog = session.pop_events();
            warn!(
                "user {}: redelivering {} undelivered events",
                user_id,
                backlog.len()
            );
            let (failed, result) = self.publish(backlog).await;
            if !failed.is_empty() {
                session.requeue_events(failed);
            }
            result?;
        }

        let now = self.clock.now();
        match resolved {
            ResolvedAction::Play(song) => session.play(song, now),
            ResolvedAction::Pause => session.pause(now)?,
            ResolvedAction::Resume => session.resume(now)?,
            ResolvedAction::Seek(target) => session.seek(target, now)?,
            ResolvedAction::Reset(song) => session.reset(song, now),
            ResolvedAction::Finish => session.finish(now)?,
        }
        let status = PlaybackStatus::of(&session, now);
        let events = session.pop_events();
        debug!(
            "user {} {} -> {} ({} events)",
            user_id,
            cmd.action.name(),
            status.state,
            events.len()
        );

        let persisted = self.sessions.persist(&session).await;
        let (failed, published) = self.publish(events).await;
        if !failed.is_empty() {
            session.requeue_events(failed);
        }
        drop(session);

        persisted?;
        published?;
        Ok(status)
    }

    async fn resolve(&self, action: &PlaybackAction) -> Result<ResolvedAction, AppError> {
        Ok(match action {
            PlaybackAction::Play { song_id } => ResolvedAction::Play(self.find_song(*song_id).await?),
            PlaybackAction::Pause => ResolvedAction::Pause,
            PlaybackAction::Resume => ResolvedAction::Resume,
            PlaybackAction::Seek { progress_seconds } => ResolvedAction::Seek(*progress_seconds),
            PlaybackAction::Reset { song_id } => match song_id {
                Some(song_id) => ResolvedAction::Reset(Some(self.find_song(*song_id).await?)),
                None => ResolvedAction::Reset(None),
            },
            PlaybackAction::Finish => ResolvedAction::Finish,
        })
    }

    async fn find_song(&self, song_id: i64) -> Result<SongRef, AppError> {
        let song_id = SongId::from(song_id);
        self.song_catalog
            .find_by_id(&song_id)
            .await?
            .map(|song| song.to_ref())
            .ok_or_else(|| AppError::NotFound("Song".to_string(), song_id.to_string()))
    }

    /// Publish every event in order. Returns the events that failed together
    /// with the first error.
    async fn publish(
        &self,
        events: Vec<PlaybackEvent>,
    ) -> (Vec<PlaybackEvent>, Result<(), AppError>) {
        let ctx = AppContext::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.event_bus.publish(ctx.envelope(event.clone())).await {
                error!("Failed to publish playback event v{}: {}", event.version, e);
                failed.push(event);
                first_error.get_or_insert(e);
            }
        }
        (failed, first_error.map_or(Ok(()), Err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler::projector::register_handlers;
    use crate::projector::playback_history::ListenPolicy;
    use crate::test_support::{
        song, t, InMemoryHistory, MemorySessions, StaticCatalog, TestBus, TestClock,
    };
    use domain::playback_session::PlaybackSessionRepository;
    use model::playback_history::{HistoryFilter, PlaybackHistoryRepository};
    use std::sync::atomic::Ordering;

    struct Fixture {
        service: PlaybackService<TestBus>,
        clock: Arc<TestClock>,
        history: Arc<InMemoryHistory>,
        sessions: Arc<SessionStore>,
    }

    async fn fixture_with(sessions: SessionStore, history: InMemoryHistory) -> Fixture {
        let clock = Arc::new(TestClock::at(0));
        let history = Arc::new(history);
        let sessions = Arc::new(sessions);
        let catalog = Arc::new(StaticCatalog::new(vec![
            song(1, 200, "Rock", 10, Some(100)),
            song(2, 180, "Rock", 10, Some(100)),
            song(3, 40, "Jazz", 11, None),
        ]));
        let mut bus = TestBus::default();
        register_handlers(&mut bus, history.clone(), ListenPolicy::default()).await;
        let service = PlaybackService::new(sessions.clone(), catalog, clock.clone(), Arc::new(bus));
        Fixture {
            service,
            clock,
            history,
            sessions,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(SessionStore::new(), InMemoryHistory::default()).await
    }

    async fn act(f: &Fixture, action: PlaybackAction) -> Result<PlaybackStatus, AppError> {
        f.service
            .apply_action(PlaybackCmd { user_id: 1, action })
            .await
    }

    async fn history_len(f: &Fixture) -> usize {
        f.history.query(&HistoryFilter::default()).await.unwrap().len()
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            PlaybackAction::parse("Play", Some(4), None).unwrap(),
            PlaybackAction::Play { song_id: 4 }
        );
        assert_eq!(
            PlaybackAction::parse("seek", None, Some(30)).unwrap(),
            PlaybackAction::Seek { progress_seconds: 30 }
        );
        assert_eq!(
            PlaybackAction::parse("reset", None, None).unwrap(),
            PlaybackAction::Reset { song_id: None }
        );
        assert!(matches!(
            PlaybackAction::parse("play", None, None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PlaybackAction::parse("seek", Some(1), None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PlaybackAction::parse("rewind", None, None),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_time_continuity_across_pause_and_resume() {
        let f = fixture().await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(10);
        let paused = act(&f, PlaybackAction::Pause).await.unwrap();
        assert_eq!(paused.state, PlaybackState::Paused);
        assert_eq!(paused.progress_seconds, 10);

        // 暂停期间时间不计入
        f.clock.advance(600);
        act(&f, PlaybackAction::Resume).await.unwrap();
        f.clock.advance(5);
        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(session.current_progress(f.clock.now()), 15);
    }

    #[tokio::test]
    async fn test_unknown_song_is_rejected_before_the_session() {
        let f = fixture().await;
        let err = act(&f, PlaybackAction::Play { song_id: 99 }).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, id) if kind == "Song" && id == "99"));

        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(session.version, 0);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_state_unchanged() {
        let f = fixture().await;
        let err = act(&f, PlaybackAction::Pause).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: PlaybackState::Idle,
                action: "pause"
            }
        ));

        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(20);
        act(&f, PlaybackAction::Pause).await.unwrap();
        let before = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        let err = act(&f, PlaybackAction::Pause).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        let after = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_history_dedup_over_pause_resume_cycles() {
        let f = fixture().await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(20);
        act(&f, PlaybackAction::Pause).await.unwrap();
        act(&f, PlaybackAction::Resume).await.unwrap();
        f.clock.advance(20);
        act(&f, PlaybackAction::Pause).await.unwrap();
        act(&f, PlaybackAction::Resume).await.unwrap();
        act(&f, PlaybackAction::Seek { progress_seconds: 90 }).await.unwrap();
        assert_eq!(history_len(&f).await, 0);

        act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap();
        let records = f.history.query(&HistoryFilter::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].song_id, SongId::from(1));
        assert_eq!(records[0].listened_seconds, 90);
        assert_eq!(records[0].played_at, t(40));
    }

    #[tokio::test]
    async fn test_short_listen_is_not_recorded() {
        let f = fixture().await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(2);
        act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap();
        assert_eq!(history_len(&f).await, 0);
    }

    #[tokio::test]
    async fn test_seek_is_clamped_to_duration() {
        let f = fixture().await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        act(&f, PlaybackAction::Pause).await.unwrap();
        let status = act(&f, PlaybackAction::Seek { progress_seconds: 9999 }).await.unwrap();
        assert_eq!(status.progress_seconds, 200);
        assert_eq!(status.state, PlaybackState::Paused);
    }

    #[tokio::test]
    async fn test_reset_and_finish_finalize_listens() {
        let f = fixture().await;
        act(&f, PlaybackAction::Play { song_id: 3 }).await.unwrap();
        f.clock.advance(25);
        let status = act(&f, PlaybackAction::Reset { song_id: Some(1) }).await.unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.song_id, Some(SongId::from(1)));
        assert_eq!(history_len(&f).await, 1);

        f.clock.advance(500);
        let status = act(&f, PlaybackAction::Finish).await.unwrap();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.progress_seconds, 0);
        let records = f.history.query(&HistoryFilter::default()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].listened_seconds, 200);

        let err = act(&f, PlaybackAction::Finish).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_history_failure_is_surfaced_after_transition() {
        let f = fixture_with(SessionStore::new(), InMemoryHistory::failing()).await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(60);
        let err = act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        // 内存中的会话已经切换
        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(session.current_song_id(), Some(&SongId::from(2)));
        assert!(session.has_pending_events());
    }

    #[tokio::test]
    async fn test_listen_rejected_by_history_is_recorded_on_retry() {
        let f = fixture_with(SessionStore::new(), InMemoryHistory::failing()).await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(120);
        let err = act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        // 仍然离线：重试被拒绝，会话不变
        f.clock.advance(5);
        let err = act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(session.current_progress(f.clock.now()), 5);

        f.history.offline.store(false, Ordering::SeqCst);
        let status = act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap();
        assert_eq!(status.song_id, Some(SongId::from(2)));

        let records = f.history.query(&HistoryFilter::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].song_id, SongId::from(1));
        assert_eq!(records[0].listened_seconds, 120);

        act(&f, PlaybackAction::Pause).await.unwrap();
        assert_eq!(history_len(&f).await, 1);
        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert!(!session.has_pending_events());
    }

    #[tokio::test]
    async fn test_one_failed_event_does_not_stop_the_rest() {
        let f = fixture_with(SessionStore::new(), InMemoryHistory::failing()).await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        f.clock.advance(60);
        let before = f.service.event_bus.published.load(Ordering::SeqCst);
        act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap_err();
        // ListenFinalized 失败后 PlaybackStarted 仍然发布
        assert_eq!(f.service.event_bus.published.load(Ordering::SeqCst), before + 2);

        let mut session = f.sessions.lock(&UserId::from(1)).await.unwrap();
        let pending = session.pop_events();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            pending[0].kind,
            domain::playback_session::PlaybackEventKind::ListenFinalized { .. }
        ));
    }

    #[tokio::test]
    async fn test_session_store_failure_still_records_the_listen() {
        let repository = Arc::new(MemorySessions::default());
        let f = fixture_with(
            SessionStore::with_repository(repository.clone()),
            InMemoryHistory::default(),
        )
        .await;
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();
        assert_eq!(repository.saves.load(Ordering::SeqCst), 1);

        repository.fail_saves.store(true, Ordering::SeqCst);
        f.clock.advance(60);
        let err = act(&f, PlaybackAction::Play { song_id: 2 }).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert_eq!(history_len(&f).await, 1);

        repository.fail_saves.store(false, Ordering::SeqCst);
        act(&f, PlaybackAction::Pause).await.unwrap();
        let saved = repository.find_by_user(&UserId::from(1)).await.unwrap().unwrap();
        assert_eq!(saved.state(), PlaybackState::Paused);
        assert_eq!(saved.current_song_id(), Some(&SongId::from(2)));
    }

    #[tokio::test]
    async fn test_concurrent_actions_for_one_user_do_not_interleave() {
        let f = Arc::new(fixture().await);
        act(&f, PlaybackAction::Play { song_id: 1 }).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let f = f.clone();
            tasks.push(tokio::spawn(async move {
                let action = if i % 2 == 0 {
                    PlaybackAction::Seek { progress_seconds: i }
                } else {
                    PlaybackAction::Play { song_id: 1 }
                };
                act(&f, action).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let session = f.sessions.snapshot(&UserId::from(1)).await.unwrap();
        assert_eq!(session.version, 21);
    }
}
