use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_catalog_domain::Song;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create playback_history table
        manager
            .create_table(
                Table::create()
                    .table(PlaybackHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaybackHistory::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(PlaybackHistory::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaybackHistory::SongId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaybackHistory::PlayedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaybackHistory::ListenedSeconds)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playback_history_song")
                            .from(PlaybackHistory::Table, PlaybackHistory::SongId)
                            .to(Song::Table, Song::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 窗口查询按时间过滤
        manager
            .create_index(
                Index::create()
                    .name("idx_playback_history_played_at")
                    .table(PlaybackHistory::Table)
                    .col(PlaybackHistory::PlayedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playback_history_user_played")
                    .table(PlaybackHistory::Table)
                    .col(PlaybackHistory::UserId)
                    .col(PlaybackHistory::PlayedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playback_history_song_played")
                    .table(PlaybackHistory::Table)
                    .col(PlaybackHistory::SongId)
                    .col(PlaybackHistory::PlayedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PlaybackHistory::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum PlaybackHistory {
    Table,
    Id,
    UserId,
    SongId,
    PlayedAt,
    ListenedSeconds,
}
