use crate::value::{AlbumId, ArtistId, SongId, Subject};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SongError {
    #[error("Song not found: {0}")]
    NotFound(SongId),
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Catalog entry for a track, as far as playback tracking needs to know it.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub duration_seconds: i64,
    pub genre: String,
    pub artist_id: ArtistId,
    pub album_id: Option<AlbumId>,
}

impl Song {
    pub fn new(
        id: SongId,
        duration_seconds: i64,
        genre: impl Into<String>,
        artist_id: ArtistId,
        album_id: Option<AlbumId>,
    ) -> Self {
        Self {
            id,
            duration_seconds: duration_seconds.max(0),
            genre: genre.into(),
            artist_id,
            album_id,
        }
    }

    /// The lightweight reference a playback session keeps for this song.
    pub fn to_ref(&self) -> SongRef {
        SongRef::new(self.id.clone(), self.duration_seconds)
    }

    pub fn belongs_to(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Song(id) => &self.id == id,
            Subject::Artist(id) => &self.artist_id == id,
            Subject::Album(id) => self.album_id.as_ref() == Some(id),
            Subject::Genre(name) => &self.genre == name,
        }
    }

    /// Every subject this song contributes to, one per kind.
    pub fn subjects(&self) -> Vec<Subject> {
        let mut subjects = vec![
            Subject::Song(self.id.clone()),
            Subject::Artist(self.artist_id.clone()),
            Subject::Genre(self.genre.clone()),
        ];
        if let Some(album_id) = &self.album_id {
            subjects.push(Subject::Album(album_id.clone()));
        }
        subjects
    }
}

/// Song id plus the duration used to clamp playback progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub id: SongId,
    pub duration_seconds: i64,
}

impl SongRef {
    pub fn new(id: SongId, duration_seconds: i64) -> Self {
        Self {
            id,
            duration_seconds: duration_seconds.max(0),
        }
    }

    /// Clamp an offset into `[0, duration_seconds]`.
    pub fn clamp(&self, seconds: i64) -> i64 {
        seconds.clamp(0, self.duration_seconds)
    }
}

#[async_trait]
pub trait SongCatalog: Send + Sync {
    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>, SongError>;
    async fn all(&self) -> Result<Vec<Song>, SongError>;
    /// Songs that belong to `subject`, ordered by id.
    async fn find_by_subject(&self, subject: &Subject) -> Result<Vec<Song>, SongError>;
}
