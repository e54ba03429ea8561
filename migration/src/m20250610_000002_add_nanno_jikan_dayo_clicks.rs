//! 「なんの時間だよ」ボタンのクリックログ
//!
//! likes と同じ形のテーブル。件数はこのテーブルの行数から数える。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NannoJikanDayoClicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NannoJikanDayoClicks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NannoJikanDayoClicks::QuestionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NannoJikanDayoClicks::IpAddress).text().null())
                    .col(
                        ColumnDef::new(NannoJikanDayoClicks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nanno_jikan_dayo_clicks_question_id")
                            .from(
                                NannoJikanDayoClicks::Table,
                                NannoJikanDayoClicks::QuestionId,
                            )
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_nanno_jikan_dayo_clicks_question_id_ip_address")
                    .table(NannoJikanDayoClicks::Table)
                    .col(NannoJikanDayoClicks::QuestionId)
                    .col(NannoJikanDayoClicks::IpAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NannoJikanDayoClicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum NannoJikanDayoClicks {
    Table,
    Id,
    QuestionId,
    IpAddress,
    CreatedAt,
}
