use super::db_data::playback_history as db;
use async_trait::async_trait;
use model::playback_history::{HistoryFilter, HistoryRecord, PlaybackHistoryRepository};
use model::ModelError;
use sea_orm::*;

pub struct PlaybackHistoryRepositoryImpl {
    db: DatabaseConnection,
}

impl PlaybackHistoryRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// Helper function to map database errors
#[inline]
fn map_db_error(e: DbErr) -> ModelError {
    ModelError::DbErr(e.to_string())
}

/// 把过滤条件翻译成查询条件
fn condition(filter: &HistoryFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(user_id) = &filter.user_id {
        cond = cond.add(db::Column::UserId.eq(user_id.as_i64()));
    }
    if let Some(song_ids) = &filter.song_ids {
        cond = cond.add(db::Column::SongId.is_in(song_ids.iter().map(|id| id.as_i64())));
    }
    if let Some(window) = &filter.window {
        cond = cond
            .add(db::Column::PlayedAt.gte(window.start))
            .add(db::Column::PlayedAt.lte(window.end));
    }
    cond
}

#[async_trait]
impl PlaybackHistoryRepository for PlaybackHistoryRepositoryImpl {
    async fn append(&self, record: &HistoryRecord) -> Result<(), ModelError> {
        let model: db::ActiveModel = record.into();
        db::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, ModelError> {
        let rows = db::Entity::find()
            .filter(condition(filter))
            .order_by_asc(db::Column::PlayedAt)
            .order_by_asc(db::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }
}
