use domain::playback_session::{PlaybackError, PlaybackState};
use domain::song::SongError;
use model::ModelError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}: {1}")]
    NotFound(String, String),
    #[error("Invalid transition: cannot {action} while {from}")]
    InvalidTransition {
        from: PlaybackState,
        action: &'static str,
    },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::InvalidTransition { from, action } => {
                AppError::InvalidTransition { from, action }
            }
            PlaybackError::StoreErr(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

impl From<SongError> for AppError {
    fn from(err: SongError) -> Self {
        match err {
            SongError::NotFound(id) => AppError::NotFound("Song".to_string(), id.to_string()),
            SongError::CatalogUnavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::DbErr(msg) => AppError::StoreUnavailable(msg),
        }
    }
}
