use super::db_data::song as db;
use async_trait::async_trait;
use domain::song::{Song, SongCatalog, SongError};
use domain::value::{SongId, Subject};
use sea_orm::*;

/// 从 `song` 表读取歌曲目录
pub struct SongCatalogImpl {
    db: DatabaseConnection,
}

impl SongCatalogImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[inline]
fn map_db_error(e: DbErr) -> SongError {
    SongError::CatalogUnavailable(e.to_string())
}

/// 主体对应的查询条件
fn subject_condition(subject: &Subject) -> Condition {
    match subject {
        Subject::Song(id) => Condition::all().add(db::Column::Id.eq(id.as_i64())),
        Subject::Artist(id) => Condition::all().add(db::Column::ArtistId.eq(id.as_i64())),
        Subject::Album(id) => Condition::all().add(db::Column::AlbumId.eq(id.as_i64())),
        Subject::Genre(name) => Condition::all().add(db::Column::Genre.eq(name.as_str())),
    }
}

#[async_trait]
impl SongCatalog for SongCatalogImpl {
    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>, SongError> {
        let row = db::Entity::find_by_id(id.as_i64())
            .one(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(row.map(Song::from))
    }

    async fn all(&self) -> Result<Vec<Song>, SongError> {
        let rows = db::Entity::find()
            .order_by_asc(db::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Song::from).collect())
    }

    async fn find_by_subject(&self, subject: &Subject) -> Result<Vec<Song>, SongError> {
        let rows = db::Entity::find()
            .filter(subject_condition(subject))
            .order_by_asc(db::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Song::from).collect())
    }
}
