use crate::error::AppError;
use crate::event::event_bus::{EventEnvelope, Handler};
use crate::projector::playback_history::{HistoryRecorder, ListenPolicy};
use async_trait::async_trait;
use domain::playback_session::{PlaybackEvent, PlaybackEventKind};
use log::error;
use model::playback_history::PlaybackHistoryRepository;
use std::sync::Arc;

pub struct PlaybackHistoryEventHandler {
    recorder: HistoryRecorder,
}

impl PlaybackHistoryEventHandler {
    pub fn new(repository: Arc<dyn PlaybackHistoryRepository>, policy: ListenPolicy) -> Self {
        Self {
            recorder: HistoryRecorder::new(repository, policy),
        }
    }
}

#[async_trait]
impl Handler<PlaybackEvent> for PlaybackHistoryEventHandler {
    async fn handle(&self, envelope: &EventEnvelope<PlaybackEvent>) -> Result<(), AppError> {
        let event = &envelope.payload;
        if let PlaybackEventKind::ListenFinalized {
            song,
            listened_seconds,
            finalized_at,
            reason: _,
        } = &event.kind
        {
            if let Err(e) = self
                .recorder
                .on_listen_finalized(&event.user_id, song, *listened_seconds, *finalized_at)
                .await
            {
                error!(
                    "Error recording playback history (correlation {:?}): {}",
                    envelope.correlation_id, e
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
