//! 管理者の「結論」欄を追加
//!
//! 1. questions に admin_conclusion（最大 500 文字、長さは API 側で検証）
//! 2. questions に admin_conclusion_updated_at
//!
//! SQLite は ALTER TABLE 一回につき一列しか追加できないので分けて実行する。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Questions::Table)
                    .add_column(ColumnDef::new(Questions::AdminConclusion).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Questions::Table)
                    .add_column(
                        ColumnDef::new(Questions::AdminConclusionUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Err(DbErr::Custom(
            "このマイグレーションは巻き戻せません。バックアップから復元してください".to_string(),
        ))
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    AdminConclusion,
    AdminConclusionUpdatedAt,
}
