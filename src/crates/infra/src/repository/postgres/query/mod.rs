pub mod db_data;
pub mod playback_history;
pub mod song_catalog;

pub use playback_history::PlaybackHistoryRepositoryImpl;
pub use song_catalog::SongCatalogImpl;
