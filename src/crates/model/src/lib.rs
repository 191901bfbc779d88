pub mod analytics;
pub mod playback_history;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Database error: {0}")]
    DbErr(String),
}
