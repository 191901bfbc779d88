use actix_web::{http::StatusCode, HttpResponse};
use application::error::AppError;
use application::query::QueryError;
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "invalid_transition",
            Self::Unavailable(_) => "store_unavailable",
            Self::Unknown(_) => "internal_error",
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(msg) => ApiError::BadRequest(msg),
            e @ AppError::NotFound(..) => ApiError::NotFound(e.to_string()),
            e @ AppError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            AppError::StoreUnavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(msg) | QueryError::InvalidParameter(msg) => {
                ApiError::BadRequest(msg)
            }
            QueryError::NotFound(msg) => ApiError::NotFound(msg),
            QueryError::DbError(msg) => ApiError::Unavailable(msg),
            QueryError::ExecutionError(msg) => ApiError::Unknown(msg),
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}
