use async_trait::async_trait;
use config::{Config, ConfigError, File};
use dashmap::DashMap;
use domain::song::{Song, SongCatalog, SongError};
use domain::value::{AlbumId, ArtistId, SongId, Subject};
use serde::Deserialize;
use std::sync::Arc;

/// 歌曲列表文件中的一项
#[derive(Debug, Deserialize)]
struct SeedSong {
    id: i64,
    duration_seconds: i64,
    genre: String,
    artist_id: i64,
    album_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedCatalog {
    songs: Vec<SeedSong>,
}

impl From<SeedSong> for Song {
    fn from(seed: SeedSong) -> Self {
        Song::new(
            SongId::from(seed.id),
            seed.duration_seconds,
            seed.genre,
            ArtistId::from(seed.artist_id),
            seed.album_id.map(AlbumId::from),
        )
    }
}

/// 内存歌曲目录，未配置数据库时使用
#[derive(Clone, Default)]
pub struct InMemorySongCatalog {
    store: Arc<DashMap<SongId, Song>>,
}

impl InMemorySongCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_songs(songs: impl IntoIterator<Item = Song>) -> Self {
        let catalog = Self::new();
        for song in songs {
            catalog.insert(song);
        }
        catalog
    }

    /// 从歌曲列表文件加载，格式由扩展名决定（`.toml` / `.json`）
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let seed: SeedCatalog = Config::builder()
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()?;
        Ok(Self::with_songs(seed.songs.into_iter().map(Song::from)))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn insert(&self, song: Song) {
        self.store.insert(song.id.clone(), song);
    }
}

#[async_trait]
impl SongCatalog for InMemorySongCatalog {
    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>, SongError> {
        Ok(self.store.get(id).map(|v| v.clone()))
    }

    async fn all(&self) -> Result<Vec<Song>, SongError> {
        let mut songs: Vec<Song> = self.store.iter().map(|e| e.value().clone()).collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(songs)
    }

    async fn find_by_subject(&self, subject: &Subject) -> Result<Vec<Song>, SongError> {
        let mut songs: Vec<Song> = self
            .store
            .iter()
            .filter(|e| e.value().belongs_to(subject))
            .map(|e| e.value().clone())
            .collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(songs)
    }
}
