use super::playback_history::PlaybackHistoryEventHandler;
use crate::event::event_bus::EventBus;
use crate::projector::playback_history::ListenPolicy;
use domain::playback_session::PlaybackEvent;
use model::playback_history::PlaybackHistoryRepository;
use std::sync::Arc;

pub async fn register_handlers<B: EventBus>(
    bus: &mut B,
    // 仓储依赖
    playback_history_repository: Arc<dyn PlaybackHistoryRepository>,
    // 收听规则
    listen_policy: ListenPolicy,
) {
    let playback_history_handler =
        PlaybackHistoryEventHandler::new(playback_history_repository, listen_policy);

    bus.subscribe::<PlaybackEvent>(Arc::new(playback_history_handler))
        .await;
}
