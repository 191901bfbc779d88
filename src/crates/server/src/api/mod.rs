pub mod analytics;
pub mod dto;
pub mod error;
pub mod playback;

use super::consts;
use actix_web::web;
use chrono::Duration;
use error::ApiError;
use infra::config::AnalyticsConfig;

/// 统计窗口天数，未指定时取配置默认值
pub(crate) fn window_days(
    days: Option<i64>,
    analytics: &AnalyticsConfig,
) -> Result<(i64, Duration), ApiError> {
    let days = days.unwrap_or(analytics.default_window_days);
    let window = Duration::try_days(days)
        .ok_or_else(|| ApiError::BadRequest(format!("days out of range: {}", days)))?;
    Ok((days, window))
}

pub fn configure_service(svc: &mut web::ServiceConfig) {
    svc.service(
        web::scope(consts::URL_PATH_API)
            .service(
                web::resource("/users/{user_id}/playback")
                    .route(web::get().to(playback::get_playback))
                    .route(web::post().to(playback::apply_playback)),
            )
            .route(
                "/users/{user_id}/history",
                web::get().to(playback::get_history),
            )
            .route("/top-songs", web::get().to(analytics::get_top_songs))
            .route(
                "/top-songs/genres",
                web::get().to(analytics::get_top_songs_by_genre),
            )
            .route(
                "/{kind}/{id}/listeners",
                web::get().to(analytics::get_listeners),
            )
            .route(
                "/{kind}/{id}/popularity",
                web::get().to(analytics::get_popularity),
            )
            .route(
                "/{kind}/{id}/top-songs",
                web::get().to(analytics::get_subject_top_songs),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::dto::*;
    use super::*;
    use crate::{setup_event_bus, AppState};
    use actix_web::{http::StatusCode, test, App};
    use chrono::{TimeZone, Utc};
    use domain::song::Song;
    use domain::value::{AlbumId, ArtistId, SongId};
    use infra::config::AppConfigImpl;
    use infra::repository::in_memory::{InMemoryPlaybackHistoryRepository, InMemorySongCatalog};
    use infra::ManualClock;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn state(clock: Arc<ManualClock>) -> web::Data<AppState> {
        let catalog = InMemorySongCatalog::with_songs(vec![
            Song::new(SongId::from(1), 200, "Rock", ArtistId::from(10), Some(AlbumId::from(100))),
            Song::new(SongId::from(2), 180, "Rock", ArtistId::from(10), Some(AlbumId::from(100))),
            Song::new(SongId::from(3), 240, "Jazz", ArtistId::from(11), None),
        ]);
        let mut state = AppState::with_components(
            AppConfigImpl::defaults(),
            Arc::new(catalog),
            Arc::new(InMemoryPlaybackHistoryRepository::new()),
            None,
            clock,
        );
        setup_event_bus(&mut state).await;
        web::Data::new(state)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn post(user_id: i64, body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri(&format!("/api/users/{}/playback", user_id))
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_listen_flows_into_history_and_stats() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(state(clock.clone()).await)
                .configure(configure_service),
        )
        .await;

        let resp: SessionResponse = test::call_and_read_body_json(
            &app,
            post(7, json!({"action": "play", "song_id": 1})).to_request(),
        )
        .await;
        assert_eq!(resp.state, "Playing");
        assert_eq!(resp.song_id, Some(1));
        assert_eq!(resp.progress_seconds, 0);

        clock.advance(Duration::seconds(120));
        let req = test::TestRequest::get()
            .uri("/api/users/7/playback")
            .to_request();
        let resp: SessionResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.progress_seconds, 120);
        assert!(!resp.is_paused);

        let resp: SessionResponse = test::call_and_read_body_json(
            &app,
            post(7, json!({"action": "play", "song_id": 3})).to_request(),
        )
        .await;
        assert_eq!(resp.song_id, Some(3));

        let req = test::TestRequest::get()
            .uri("/api/users/7/history")
            .to_request();
        let history: HistoryResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.total, 1);
        assert_eq!(history.records[0].song_id, 1);
        assert_eq!(history.records[0].listened_seconds, 120);

        let req = test::TestRequest::get()
            .uri("/api/top-songs?days=7")
            .to_request();
        let top: Vec<TopSongEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].song_id, 1);
        assert_eq!(top[0].play_count, 1);

        let req = test::TestRequest::get()
            .uri("/api/artist/10/listeners")
            .to_request();
        let listeners: ListenersResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listeners.listeners, 1);
        assert_eq!(listeners.plays, 1);
        assert_eq!(listeners.days, 30);

        let req = test::TestRequest::get()
            .uri("/api/genre/Rock/popularity")
            .to_request();
        let rank: PopularityResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rank.rank, 1);

        let req = test::TestRequest::get()
            .uri("/api/top-songs/genres")
            .to_request();
        let groups: Vec<GenreTopSongsEntry> = test::call_and_read_body_json(&app, req).await;
        let genres: Vec<&str> = groups.iter().map(|g| g.genre.as_str()).collect();
        assert_eq!(genres, vec!["Rock"]);
    }

    #[actix_web::test]
    async fn test_pause_and_resume_over_http() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(state(clock.clone()).await)
                .configure(configure_service),
        )
        .await;

        test::call_service(&app, post(3, json!({"action": "play", "song_id": 2})).to_request())
            .await;
        clock.advance(Duration::seconds(40));
        let resp: SessionResponse =
            test::call_and_read_body_json(&app, post(3, json!({"action": "pause"})).to_request())
                .await;
        assert_eq!(resp.state, "Paused");
        assert!(resp.is_paused);
        assert_eq!(resp.progress_seconds, 40);

        clock.advance(Duration::seconds(600));
        let resp: SessionResponse =
            test::call_and_read_body_json(&app, post(3, json!({"action": "resume"})).to_request())
                .await;
        assert_eq!(resp.progress_seconds, 40);

        clock.advance(Duration::seconds(10));
        let resp: SessionResponse = test::call_and_read_body_json(
            &app,
            post(3, json!({"action": "seek", "progress_seconds": 9999})).to_request(),
        )
        .await;
        assert_eq!(resp.progress_seconds, 180);
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let app = test::init_service(
            App::new()
                .app_data(state(clock()).await)
                .configure(configure_service),
        )
        .await;

        let cases = vec![
            (post(1, json!({"action": "pause"})).to_request(), StatusCode::CONFLICT),
            (
                post(1, json!({"action": "play", "song_id": 99})).to_request(),
                StatusCode::NOT_FOUND,
            ),
            (post(1, json!({"action": "dance"})).to_request(), StatusCode::BAD_REQUEST),
            (post(1, json!({"action": "play"})).to_request(), StatusCode::BAD_REQUEST),
            (
                test::TestRequest::get()
                    .uri("/api/planet/1/listeners")
                    .to_request(),
                StatusCode::NOT_FOUND,
            ),
            (
                test::TestRequest::get()
                    .uri("/api/artist/abc/listeners")
                    .to_request(),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::get()
                    .uri("/api/artist/404/popularity")
                    .to_request(),
                StatusCode::NOT_FOUND,
            ),
            (
                test::TestRequest::get()
                    .uri("/api/top-songs?days=-1")
                    .to_request(),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (req, status) in cases {
            let uri = req.uri().to_string();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), status, "{}", uri);
        }

        let resp = test::call_service(&app, post(1, json!({"action": "pause"})).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_transition");
    }
}
