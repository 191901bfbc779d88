use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use domain::song::Song;
use domain::value::{AlbumId, ArtistId, SongId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "song")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[sea_orm(column_type = "BigInteger")]
    pub id: i64,
    #[sea_orm(column_type = "BigInteger")]
    pub duration_seconds: i64,
    pub genre: String,
    #[sea_orm(column_type = "BigInteger")]
    pub artist_id: i64,
    #[sea_orm(column_type = "BigInteger", nullable)]
    pub album_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Song {
    fn from(model: Model) -> Self {
        Song::new(
            SongId::from(model.id),
            model.duration_seconds,
            model.genre,
            ArtistId::from(model.artist_id),
            model.album_id.map(AlbumId::from),
        )
    }
}
