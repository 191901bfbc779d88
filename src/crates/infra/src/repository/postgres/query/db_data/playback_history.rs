use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use serde::{Deserialize, Serialize};

use domain::value::{SongId, UserId};
use model::playback_history::HistoryRecord;

use super::song;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "playback_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    #[sea_orm(column_type = "BigInteger")]
    pub id: i64,

    #[sea_orm(column_type = "BigInteger")]
    pub user_id: i64,
    #[sea_orm(column_type = "BigInteger")]
    pub song_id: i64,
    pub played_at: DateTimeUtc,
    #[sea_orm(column_type = "BigInteger")]
    pub listened_seconds: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Song,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Song => Entity::belongs_to(song::Entity)
                .from(Column::SongId)
                .to(song::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for HistoryRecord {
    fn from(model: Model) -> Self {
        HistoryRecord {
            user_id: UserId::from(model.user_id),
            song_id: SongId::from(model.song_id),
            played_at: model.played_at,
            listened_seconds: model.listened_seconds,
        }
    }
}

impl From<&HistoryRecord> for ActiveModel {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: NotSet,
            user_id: Set(record.user_id.as_i64()),
            song_id: Set(record.song_id.as_i64()),
            played_at: Set(record.played_at),
            listened_seconds: Set(record.listened_seconds),
        }
    }
}
