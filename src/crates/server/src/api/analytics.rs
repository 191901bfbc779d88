use super::dto::{
    GenreTopSongsEntry, ListenersResponse, PopularityResponse, TopSongEntry, TopSongsParams,
    WindowParams,
};
use super::error::ApiError;
use super::window_days;
use crate::AppState;
use actix_web::{web, web::Path, web::Query, HttpResponse};
use application::query::get_listener_count::GetListenerCount;
use application::query::get_popularity_rank::GetPopularityRank;
use application::query::get_top_songs::GetTopSongs;
use domain::value::{Subject, SubjectKind};

/// `/{kind}/{id}` 路径段解析为主体：未知类型 404，非法 id 400
fn parse_subject(kind: &str, id: &str) -> Result<Subject, ApiError> {
    let kind: SubjectKind = kind
        .parse()
        .map_err(|e: domain::value::UnknownSubjectKind| ApiError::NotFound(e.to_string()))?;
    Subject::parse(kind, id)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid {} id: {}", kind, id)))
}

fn top_songs_query(state: &AppState) -> GetTopSongs {
    GetTopSongs::new(
        state.playback_history.clone(),
        state.song_catalog.clone(),
        state.clock.clone(),
    )
}

pub async fn get_top_songs(
    state: web::Data<AppState>,
    params: Query<TopSongsParams>,
) -> Result<HttpResponse, ApiError> {
    let analytics = state.app_cfg.analytics();
    let (_, window) = window_days(params.days, &analytics)?;
    let limit = params.limit.unwrap_or(analytics.default_limit);
    let genre = params.genre.as_deref().map(str::trim).filter(|g| !g.is_empty());
    let songs = top_songs_query(&state).handle(window, limit, genre).await?;
    let body: Vec<TopSongEntry> = songs.into_iter().map(TopSongEntry::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_top_songs_by_genre(
    state: web::Data<AppState>,
    params: Query<TopSongsParams>,
) -> Result<HttpResponse, ApiError> {
    let analytics = state.app_cfg.analytics();
    let (_, window) = window_days(params.days, &analytics)?;
    let limit = params.limit.unwrap_or(analytics.default_limit);
    let groups = top_songs_query(&state).by_genre(window, limit).await?;
    let body: Vec<GenreTopSongsEntry> = groups.into_iter().map(GenreTopSongsEntry::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_listeners(
    state: web::Data<AppState>,
    path: Path<(String, String)>,
    params: Query<WindowParams>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let subject = parse_subject(&kind, &id)?;
    let (days, window) = window_days(params.days, &state.app_cfg.analytics())?;
    let query = GetListenerCount::new(
        state.playback_history.clone(),
        state.song_catalog.clone(),
        state.clock.clone(),
    );
    let (listeners, plays) = futures::try_join!(
        query.handle(&subject, window),
        query.play_count(&subject, window)
    )?;
    Ok(HttpResponse::Ok().json(ListenersResponse {
        kind: subject.kind().to_string(),
        id,
        days,
        listeners,
        plays,
    }))
}

pub async fn get_popularity(
    state: web::Data<AppState>,
    path: Path<(String, String)>,
    params: Query<WindowParams>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let subject = parse_subject(&kind, &id)?;
    let (days, window) = window_days(params.days, &state.app_cfg.analytics())?;
    let query = GetPopularityRank::new(
        state.playback_history.clone(),
        state.song_catalog.clone(),
        state.clock.clone(),
    );
    let rank = query.handle(&subject, window).await?;
    Ok(HttpResponse::Ok().json(PopularityResponse {
        kind: subject.kind().to_string(),
        id,
        days,
        rank,
    }))
}

pub async fn get_subject_top_songs(
    state: web::Data<AppState>,
    path: Path<(String, String)>,
    params: Query<TopSongsParams>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let subject = parse_subject(&kind, &id)?;
    let analytics = state.app_cfg.analytics();
    let (_, window) = window_days(params.days, &analytics)?;
    let limit = params.limit.unwrap_or(analytics.default_limit);
    let songs = top_songs_query(&state)
        .for_subject(&subject, window, limit)
        .await?;
    let body: Vec<TopSongEntry> = songs.into_iter().map(TopSongEntry::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
