use application::command::playback::PlaybackStatus;
use application::query::get_session_view::SessionView;
use application::query::get_user_history::HistoryPage;
use domain::playback_session::PlaybackState;
use model::analytics::{GenreTopSongs, TopSong};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PlaybackRequest {
    pub action: String,
    pub song_id: Option<i64>,
    pub progress_seconds: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub state: String,
    pub song_id: Option<i64>,
    pub progress_seconds: i64,
    pub is_paused: bool,
}

impl From<PlaybackStatus> for SessionResponse {
    fn from(status: PlaybackStatus) -> Self {
        Self {
            state: status.state.to_string(),
            song_id: status.song_id.map(|id| id.as_i64()),
            progress_seconds: status.progress_seconds,
            is_paused: status.state == PlaybackState::Paused,
        }
    }
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        Self {
            state: view.state.to_string(),
            song_id: view.song_id.map(|id| id.as_i64()),
            progress_seconds: view.progress_seconds,
            is_paused: view.is_paused,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub days: Option<i64>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub song_id: i64,
    /// RFC 3339
    pub played_at: String,
    pub listened_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub records: Vec<HistoryEntry>,
}

impl From<HistoryPage> for HistoryResponse {
    fn from(page: HistoryPage) -> Self {
        Self {
            total: page.total,
            records: page
                .records
                .into_iter()
                .map(|r| HistoryEntry {
                    song_id: r.song_id.as_i64(),
                    played_at: r.played_at.to_rfc3339(),
                    listened_seconds: r.listened_seconds,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopSongsParams {
    pub days: Option<i64>,
    pub limit: Option<usize>,
    pub genre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TopSongEntry {
    pub song_id: i64,
    pub play_count: i64,
    pub last_played_at: String,
}

impl From<TopSong> for TopSongEntry {
    fn from(song: TopSong) -> Self {
        Self {
            song_id: song.song_id.as_i64(),
            play_count: song.play_count,
            last_played_at: song.last_played_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenreTopSongsEntry {
    pub genre: String,
    pub songs: Vec<TopSongEntry>,
}

impl From<GenreTopSongs> for GenreTopSongsEntry {
    fn from(group: GenreTopSongs) -> Self {
        Self {
            genre: group.genre,
            songs: group.songs.into_iter().map(TopSongEntry::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListenersResponse {
    pub kind: String,
    pub id: String,
    pub days: i64,
    pub listeners: i64,
    pub plays: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PopularityResponse {
    pub kind: String,
    pub id: String,
    pub days: i64,
    pub rank: usize,
}
