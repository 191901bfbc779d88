use crate::event::DomainEvent;
use crate::song::SongRef;
use crate::value::{SongId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::fmt;
use thiserror::Error;

/// Finite playback state of a session, derived from `song` and `is_paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// Why a listen was closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// Another song was started while this one was loaded.
    Replaced,
    /// The session was reset.
    Reset,
    /// The transport reported the end of the track.
    TrackEnded,
}

/// Domain events emitted by `PlaybackSession`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEventKind {
    PlaybackStarted {
        song_id: SongId,
    },
    PlaybackPaused {
        song_id: SongId,
        progress_seconds: i64,
    },
    PlaybackResumed {
        song_id: SongId,
        progress_seconds: i64,
    },
    PlaybackSeeked {
        song_id: SongId,
        progress_seconds: i64,
    },
    /// A listen was closed out. Whether it counts as a play is decided downstream.
    ListenFinalized {
        song: SongRef,
        listened_seconds: i64,
        finalized_at: DateTime<Utc>,
        reason: FinalizeReason,
    },
    SessionReset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub user_id: UserId,
    pub version: i64,
    pub kind: PlaybackEventKind,
}

impl DomainEvent for PlaybackEvent {
    fn aggregate_id(&self) -> i64 {
        self.user_id.as_i64()
    }
    fn version(&self) -> i64 {
        self.version
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Invalid transition: cannot {action} while {from}")]
    InvalidTransition {
        from: PlaybackState,
        action: &'static str,
    },
    #[error("Session store error: {0}")]
    StoreErr(String),
}

/// One listener's live playback state.
///
/// Elapsed time is never accumulated. While playing it is reconstructed as
/// `now - started_at`; pausing freezes it into `progress_seconds` and resuming
/// moves `started_at` back by that amount, so there is exactly one anchor per
/// state.
///
/// Invariant: with no song loaded the session is not paused, has no progress
/// and no pause timestamp. `progress_seconds` stays within the song duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub user_id: UserId,
    pub song: Option<SongRef>,
    pub started_at: Option<DateTime<Utc>>,
    pub progress_seconds: i64,
    pub paused_at: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub version: i64,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackSession {
    /// Fresh idle session.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            song: None,
            started_at: None,
            progress_seconds: 0,
            paused_at: None,
            is_paused: false,
            version: 0,
            pending_events: Vec::new(),
        }
    }

    /// Rebuild a session from persisted fields.
    ///
    /// Well-formed input comes back unchanged. Input that breaks the session
    /// invariant is normalised instead of trusted.
    pub fn restore(
        user_id: UserId,
        song: Option<SongRef>,
        started_at: Option<DateTime<Utc>>,
        progress_seconds: i64,
        paused_at: Option<DateTime<Utc>>,
        is_paused: bool,
        version: i64,
    ) -> Self {
        let mut session = Self::new(user_id);
        session.version = version;
        if let Some(song) = song {
            let paused = is_paused && paused_at.is_some();
            session.progress_seconds = song.clamp(progress_seconds);
            session.started_at = started_at;
            session.paused_at = if paused { paused_at } else { None };
            session.is_paused = paused;
            session.song = Some(song);
        }
        session
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.song, self.is_paused) {
            (None, _) => PlaybackState::Idle,
            (Some(_), true) => PlaybackState::Paused,
            (Some(_), false) => PlaybackState::Playing,
        }
    }

    pub fn current_song_id(&self) -> Option<&SongId> {
        self.song.as_ref().map(|s| &s.id)
    }

    /// Playback offset at `now`, always within the track bounds.
    pub fn current_progress(&self, now: DateTime<Utc>) -> i64 {
        match self.state() {
            PlaybackState::Idle => 0,
            PlaybackState::Paused => self.progress_seconds,
            PlaybackState::Playing => self.elapsed_since_anchor(now),
        }
    }

    fn elapsed_since_anchor(&self, now: DateTime<Utc>) -> i64 {
        match (&self.song, self.started_at) {
            (Some(song), Some(started_at)) => song.clamp((now - started_at).num_seconds()),
            _ => 0,
        }
    }

    fn touch_op(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    /// Emit and buffer a domain event for later dispatch.
    fn record(&mut self, kind: PlaybackEventKind) {
        let event = PlaybackEvent {
            user_id: self.user_id.clone(),
            version: self.version,
            kind,
        };
        self.pending_events.push(event);
    }

    fn invalid(&self, action: &'static str) -> PlaybackError {
        PlaybackError::InvalidTransition {
            from: self.state(),
            action,
        }
    }

    /// Close out the loaded song's listen. Leaves the session fields alone.
    fn finalize(&mut self, now: DateTime<Utc>, reason: FinalizeReason) {
        if let Some(song) = self.song.clone() {
            let listened_seconds = self.current_progress(now);
            debug!(
                "user {} finalized song {} after {}s ({:?})",
                self.user_id, song.id, listened_seconds, reason
            );
            self.record(PlaybackEventKind::ListenFinalized {
                song,
                listened_seconds,
                finalized_at: now,
                reason,
            });
        }
    }

    fn clear(&mut self) {
        self.song = None;
        self.started_at = None;
        self.progress_seconds = 0;
        self.paused_at = None;
        self.is_paused = false;
    }

    /// Load `song` and start it from the beginning. Valid from any state.
    ///
    /// A different song that is still loaded has its listen finalized first.
    /// Starting the song that is already loaded restarts it.
    pub fn play(&mut self, song: SongRef, now: DateTime<Utc>) {
        self.touch_op();
        if self.current_song_id().is_some_and(|id| *id != song.id) {
            self.finalize(now, FinalizeReason::Replaced);
        }
        let song_id = song.id.clone();
        self.song = Some(song);
        self.started_at = Some(now);
        self.progress_seconds = 0;
        self.paused_at = None;
        self.is_paused = false;
        self.record(PlaybackEventKind::PlaybackStarted { song_id });
    }

    /// Freeze progress. Only valid while playing.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), PlaybackError> {
        let song_id = match (&self.song, self.is_paused) {
            (Some(song), false) => song.id.clone(),
            _ => return Err(self.invalid("pause")),
        };
        self.touch_op();
        self.progress_seconds = self.elapsed_since_anchor(now);
        self.paused_at = Some(now);
        self.is_paused = true;
        self.record(PlaybackEventKind::PlaybackPaused {
            song_id,
            progress_seconds: self.progress_seconds,
        });
        Ok(())
    }

    /// Continue from the frozen offset. Only valid while paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), PlaybackError> {
        let song_id = match (&self.song, self.is_paused) {
            (Some(song), true) => song.id.clone(),
            _ => return Err(self.invalid("resume")),
        };
        self.touch_op();
        self.started_at = Some(now - Duration::seconds(self.progress_seconds));
        self.paused_at = None;
        self.is_paused = false;
        self.record(PlaybackEventKind::PlaybackResumed {
            song_id,
            progress_seconds: self.progress_seconds,
        });
        Ok(())
    }

    /// Move the cursor. Out-of-range targets are clamped to the track bounds.
    pub fn seek(&mut self, target_seconds: i64, now: DateTime<Utc>) -> Result<(), PlaybackError> {
        let (song_id, target) = match &self.song {
            Some(song) => (song.id.clone(), song.clamp(target_seconds)),
            None => return Err(self.invalid("seek")),
        };
        self.touch_op();
        if !self.is_paused {
            self.started_at = Some(now - Duration::seconds(target));
        }
        self.progress_seconds = target;
        self.record(PlaybackEventKind::PlaybackSeeked {
            song_id,
            progress_seconds: target,
        });
        Ok(())
    }

    /// Finalize whatever is loaded and return to idle, optionally starting `song`.
    pub fn reset(&mut self, song: Option<SongRef>, now: DateTime<Utc>) {
        self.touch_op();
        self.finalize(now, FinalizeReason::Reset);
        self.clear();
        self.record(PlaybackEventKind::SessionReset);
        if let Some(song) = song {
            self.play(song, now);
        }
    }

    /// End-of-track signal from the transport: finalize and go idle.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<(), PlaybackError> {
        if self.song.is_none() {
            return Err(self.invalid("finish"));
        }
        self.touch_op();
        self.finalize(now, FinalizeReason::TrackEnded);
        self.clear();
        Ok(())
    }

    pub fn pop_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Put back events that could not be delivered, ahead of anything
    /// recorded since, so the next drain yields them first.
    pub fn requeue_events(&mut self, mut events: Vec<PlaybackEvent>) {
        events.append(&mut self.pending_events);
        self.pending_events = events;
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }
}

#[async_trait]
pub trait PlaybackSessionRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &UserId)
        -> Result<Option<PlaybackSession>, PlaybackError>;
    async fn save(&self, session: &PlaybackSession) -> Result<(), PlaybackError>;
}
