use chrono::{DateTime, Utc};
use domain::value::SongId;

/// One entry of a "top songs" ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSong {
    pub song_id: SongId,
    pub play_count: i64,
    /// Most recent play of this song inside the window.
    pub last_played_at: DateTime<Utc>,
}

/// Ranking for a single genre.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreTopSongs {
    pub genre: String,
    pub songs: Vec<TopSong>,
}
