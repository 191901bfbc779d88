pub mod playback_history;
pub mod song_catalog;

pub use playback_history::InMemoryPlaybackHistoryRepository;
pub use song_catalog::InMemorySongCatalog;
