use super::dto::{HistoryParams, HistoryResponse, PlaybackRequest, SessionResponse};
use super::error::ApiError;
use super::window_days;
use crate::AppState;
use actix_web::{web, web::Json, web::Path, web::Query, HttpResponse};
use application::command::playback::{PlaybackAction, PlaybackCmd};
use application::query::get_session_view::GetSessionView;
use application::query::get_user_history::GetUserHistory;
use log::debug;

pub async fn apply_playback(
    state: web::Data<AppState>,
    path: Path<i64>,
    Json(req): Json<PlaybackRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let action = PlaybackAction::parse(&req.action, req.song_id, req.progress_seconds)?;
    debug!("user {} -> {}", user_id, action.name());
    let status = state
        .playback_service
        .apply_action(PlaybackCmd { user_id, action })
        .await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(status)))
}

pub async fn get_playback(
    state: web::Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let query = GetSessionView::new(state.sessions.clone(), state.clock.clone());
    let view = query.handle(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(view)))
}

pub async fn get_history(
    state: web::Data<AppState>,
    path: Path<i64>,
    params: Query<HistoryParams>,
) -> Result<HttpResponse, ApiError> {
    let analytics = state.app_cfg.analytics();
    let (_, window) = window_days(params.days, &analytics)?;
    let query = GetUserHistory::new(state.playback_history.clone(), state.clock.clone());
    let page = query
        .handle(
            path.into_inner(),
            window,
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(analytics.default_limit),
        )
        .await?;
    Ok(HttpResponse::Ok().json(HistoryResponse::from(page)))
}
