pub mod repository;

pub mod event_bus;
pub use event_bus::InMemoryEventBus;

pub mod clock;
pub use clock::{ManualClock, SystemClock};

pub mod config;
pub use config::{
    AnalyticsConfig, AppConfigImpl, CatalogConfig, PlaybackConfig, ServerConfig, SessionConfig,
};
