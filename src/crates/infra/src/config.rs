use application::projector::playback_history::ListenPolicy;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    database_url: String,
    /// 服务器配置
    server: RawServerConfig,
    /// 收听计数规则
    playback: RawPlaybackConfig,
    /// 统计查询默认值
    analytics: RawAnalyticsConfig,
    /// 会话持久化
    session: RawSessionConfig,
    /// 无数据库时的歌曲目录
    catalog: RawCatalogConfig,
}

/// 服务器配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    /// 监听地址
    host: String,
    /// 监听端口
    port: u16,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5533,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawPlaybackConfig {
    /// 至少收听多少秒才计为一次播放
    min_listen_seconds: i64,
    /// 或者至少收听歌曲时长的比例，两者取较小值
    min_listen_ratio: f64,
}

impl Default for RawPlaybackConfig {
    fn default() -> Self {
        Self {
            min_listen_seconds: 30,
            min_listen_ratio: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawAnalyticsConfig {
    default_window_days: i64,
    default_limit: usize,
}

impl Default for RawAnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
            default_limit: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSessionConfig {
    /// 是否把会话写入 sled
    persist: bool,
    data_dir: String,
}

impl Default for RawSessionConfig {
    fn default() -> Self {
        Self {
            persist: false,
            data_dir: "./data/sessions".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalogConfig {
    /// 歌曲列表文件（toml / json），仅在没有 database_url 时使用
    songs_file: Option<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            database_url: "".to_string(),
            server: RawServerConfig::default(),
            playback: RawPlaybackConfig::default(),
            analytics: RawAnalyticsConfig::default(),
            session: RawSessionConfig::default(),
            catalog: RawCatalogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 收听计数规则
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub min_listen_seconds: i64,
    pub min_listen_ratio: f64,
}

impl PlaybackConfig {
    pub fn listen_policy(&self) -> ListenPolicy {
        ListenPolicy::new(self.min_listen_seconds, self.min_listen_ratio)
    }
}

/// 统计查询默认值
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub default_window_days: i64,
    pub default_limit: usize,
}

/// 会话持久化配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub persist: bool,
    pub data_dir: String,
}

impl SessionConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

/// 内存歌曲目录的来源
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub songs_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    pub database_url: Arc<RwLock<String>>,
    pub server: Arc<RwLock<ServerConfig>>,
    pub playback: Arc<RwLock<PlaybackConfig>>,
    pub analytics: Arc<RwLock<AnalyticsConfig>>,
    pub session: Arc<RwLock<SessionConfig>>,
    pub catalog: Arc<RwLock<CatalogConfig>>,
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Self {
        let server_config = ServerConfig {
            host: data.server.host,
            port: data.server.port,
        };
        let playback_config = PlaybackConfig {
            min_listen_seconds: data.playback.min_listen_seconds,
            min_listen_ratio: data.playback.min_listen_ratio,
        };
        let analytics_config = AnalyticsConfig {
            default_window_days: data.analytics.default_window_days,
            default_limit: data.analytics.default_limit,
        };
        let session_config = SessionConfig {
            persist: data.session.persist,
            data_dir: data.session.data_dir,
        };
        AppConfigImpl {
            database_url: Arc::new(RwLock::new(data.database_url)),
            server: Arc::new(RwLock::new(server_config)),
            playback: Arc::new(RwLock::new(playback_config)),
            analytics: Arc::new(RwLock::new(analytics_config)),
            session: Arc::new(RwLock::new(session_config)),
            catalog: Arc::new(RwLock::new(CatalogConfig {
                songs_file: data.catalog.songs_file,
            })),
        }
    }

    pub fn load() -> Result<AppConfigImpl, Box<dyn Error>> {
        dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<AppConfigImpl, Box<dyn Error>> {
        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        Ok(AppConfigImpl::new(raw))
    }

    /// 内置默认值，不读取任何配置源
    pub fn defaults() -> AppConfigImpl {
        AppConfigImpl::new(RawConfig::default())
    }

    pub fn database_url(&self) -> String {
        let cfg_val = self.database_url.read().unwrap_or_else(|e| e.into_inner());
        (*cfg_val).clone()
    }

    pub fn server(&self) -> ServerConfig {
        let cfg_val = self.server.read().unwrap_or_else(|e| e.into_inner());
        cfg_val.clone()
    }

    pub fn playback(&self) -> PlaybackConfig {
        let cfg_val = self.playback.read().unwrap_or_else(|e| e.into_inner());
        cfg_val.clone()
    }

    pub fn analytics(&self) -> AnalyticsConfig {
        let cfg_val = self.analytics.read().unwrap_or_else(|e| e.into_inner());
        cfg_val.clone()
    }

    pub fn session(&self) -> SessionConfig {
        let cfg_val = self.session.read().unwrap_or_else(|e| e.into_inner());
        cfg_val.clone()
    }

    pub fn catalog(&self) -> CatalogConfig {
        let cfg_val = self.catalog.read().unwrap_or_else(|e| e.into_inner());
        cfg_val.clone()
    }
}
