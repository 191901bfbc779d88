pub mod api;
pub mod consts;
pub mod middleware;

use application::command::playback::PlaybackService;
use application::event::handler::projector::registry::register_handlers;
use application::session_store::SessionStore;
use application::shared::Clock;
use domain::playback_session::PlaybackSessionRepository;
use domain::song::SongCatalog;
use infra::config::AppConfigImpl;
use infra::event_bus::in_memory::InMemoryEventBus;
use infra::repository::in_memory::{InMemoryPlaybackHistoryRepository, InMemorySongCatalog};
use infra::repository::postgres::query::{PlaybackHistoryRepositoryImpl, SongCatalogImpl};
use infra::repository::sled_store::SledPlaybackSessionRepository;
use infra::SystemClock;
use log::{info, warn};
use model::playback_history::PlaybackHistoryRepository;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub event_bus: InMemoryEventBus,
    pub clock: Arc<dyn Clock>,
    pub sessions: Arc<SessionStore>,
    pub song_catalog: Arc<dyn SongCatalog>,
    pub playback_history: Arc<dyn PlaybackHistoryRepository>,
    pub playback_service: Arc<PlaybackService<InMemoryEventBus>>,
}

impl AppState {
    pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(32)
            .min_connections(4)
            .connect_timeout(Duration::from_secs(3))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(300))
            .sqlx_logging(false)
            .sqlx_logging_level(log::LevelFilter::Info);

        let db = Database::connect(opt).await?;

        let backend = DbBackend::Postgres;
        db.execute(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await?;

        info!("Database connection pool initialized successfully");
        Ok(db)
    }

    /// 根据配置组装仓储：有数据库时用 postgres，否则用内存实现
    pub fn new(
        app_cfg: AppConfigImpl,
        db: Option<DatabaseConnection>,
    ) -> Result<Self, Box<dyn Error>> {
        let (song_catalog, playback_history): (Arc<dyn SongCatalog>, Arc<dyn PlaybackHistoryRepository>) =
            match db {
                Some(db) => (
                    Arc::new(SongCatalogImpl::new(db.clone())),
                    Arc::new(PlaybackHistoryRepositoryImpl::new(db)),
                ),
                None => {
                    info!("No database configured, using in-memory catalog and history");
                    (
                        Arc::new(in_memory_catalog(&app_cfg)?),
                        Arc::new(InMemoryPlaybackHistoryRepository::new()),
                    )
                }
            };

        let session_cfg = app_cfg.session();
        let session_repository: Option<Arc<dyn PlaybackSessionRepository>> = if session_cfg.persist
        {
            info!("Persisting sessions to {}", session_cfg.data_dir);
            Some(Arc::new(SledPlaybackSessionRepository::new(
                session_cfg.data_path(),
            )?))
        } else {
            None
        };

        Ok(Self::with_components(
            app_cfg,
            song_catalog,
            playback_history,
            session_repository,
            Arc::new(SystemClock),
        ))
    }

    pub fn with_components(
        app_cfg: AppConfigImpl,
        song_catalog: Arc<dyn SongCatalog>,
        playback_history: Arc<dyn PlaybackHistoryRepository>,
        session_repository: Option<Arc<dyn PlaybackSessionRepository>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let event_bus = InMemoryEventBus::new();
        let sessions = Arc::new(match session_repository {
            Some(repository) => SessionStore::with_repository(repository),
            None => SessionStore::new(),
        });
        let playback_service = Arc::new(PlaybackService::new(
            sessions.clone(),
            song_catalog.clone(),
            clock.clone(),
            Arc::new(event_bus.clone()),
        ));

        Self {
            app_cfg,
            event_bus,
            clock,
            sessions,
            song_catalog,
            playback_history,
            playback_service,
        }
    }
}

/// 无数据库时的歌曲目录：从 `catalog.songs_file` 加载
fn in_memory_catalog(app_cfg: &AppConfigImpl) -> Result<InMemorySongCatalog, Box<dyn Error>> {
    let catalog = match app_cfg.catalog().songs_file {
        Some(path) => {
            let catalog = InMemorySongCatalog::from_file(&path)?;
            info!("Loaded {} songs from {}", catalog.len(), path);
            catalog
        }
        None => InMemorySongCatalog::new(),
    };
    if catalog.is_empty() {
        warn!("Song catalog is empty: set database_url or catalog.songs_file");
    }
    Ok(catalog)
}

pub async fn setup_event_bus(state: &mut AppState) {
    let listen_policy = state.app_cfg.playback().listen_policy();
    info!(
        "Listen policy: {}s or {:.0}% of the track",
        listen_policy.min_listen_seconds,
        listen_policy.min_listen_ratio * 100.0
    );
    register_handlers(
        &mut state.event_bus,
        state.playback_history.clone(),
        listen_policy,
    )
    .await;
}
