use crate::error::AppError;
use domain::song::SongError;
use model::ModelError;
use thiserror::Error;

pub mod aggregator;
pub mod get_listener_count;
pub mod get_popularity_rank;
pub mod get_session_view;
pub mod get_top_songs;
pub mod get_user_history;
pub mod shared;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Database error: {0}")]
    DbError(String),
}

impl From<ModelError> for QueryError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::DbErr(msg) => QueryError::DbError(msg),
        }
    }
}

impl From<SongError> for QueryError {
    fn from(e: SongError) -> Self {
        match e {
            SongError::NotFound(id) => QueryError::NotFound(format!("song {}", id)),
            SongError::CatalogUnavailable(msg) => QueryError::DbError(msg),
        }
    }
}

impl From<AppError> for QueryError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::InvalidInput(msg) => QueryError::InvalidInput(msg),
            AppError::NotFound(kind, id) => QueryError::NotFound(format!("{} {}", kind, id)),
            AppError::StoreUnavailable(msg) => QueryError::DbError(msg),
            e @ AppError::InvalidTransition { .. } => QueryError::ExecutionError(e.to_string()),
        }
    }
}
