//! 回答エンティティ
//!
//! 回答できるのは二人のキャラクターだけ。公開画面には作成順で最初の一件のみが出る。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 回答者（固定の二人）
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Responder {
    #[sea_orm(string_value = "俺")]
    #[serde(rename = "俺")]
    Ore,
    #[sea_orm(string_value = "たま")]
    #[serde(rename = "たま")]
    Tama,
}

impl Responder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "俺" => Some(Self::Ore),
            "たま" => Some(Self::Tama),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub question_id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// 外部の画像ホスティングに置いた画像の URL
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub link_url: Option<String>,
    pub responder: Responder,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id",
        on_delete = "Cascade"
    )]
    Questions,
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
