//! 質問エンティティ
//!
//! questions は中心となるテーブル。回答・コメント・いいね・クリックログはすべてここにぶら下がる。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 質問カテゴリ（固定の三種）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Category {
    #[sea_orm(string_value = "AI")]
    #[serde(rename = "AI")]
    Ai,
    #[sea_orm(string_value = "都市伝説")]
    #[serde(rename = "都市伝説")]
    UrbanLegend,
    #[sea_orm(string_value = "その他")]
    #[serde(rename = "その他")]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::UrbanLegend => "都市伝説",
            Self::Other => "その他",
        }
    }

    /// 完全一致でのみ変換する（大文字小文字も区別）
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AI" => Some(Self::Ai),
            "都市伝説" => Some(Self::UrbanLegend),
            "その他" => Some(Self::Other),
            _ => None,
        }
    }
}

/// 回答状態
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "answered")]
    Answered,
}

impl QuestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "answered" => Some(Self::Answered),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    // === 本文 ===
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: Option<Category>,
    pub status: QuestionStatus,

    // === 投稿者 ===
    #[sea_orm(column_type = "Text")]
    pub submitter_nickname: String,
    /// 投稿したクライアントだけが知っている識別子。公開レスポンスには出さない
    #[sea_orm(column_type = "Text", nullable)]
    #[serde(skip_serializing)]
    pub notification_token: Option<String>,

    // === 管理者の結論（本文と時刻は必ず同時に設定・消去する）===
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_conclusion: Option<String>,
    pub admin_conclusion_updated_at: Option<DateTimeUtc>,

    // === 時刻 ===
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::answers::Entity")]
    Answers,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::likes::Entity")]
    Likes,
    #[sea_orm(has_many = "super::nanno_jikan_dayo_clicks::Entity")]
    NannoJikanDayoClicks,
}

impl Related<super::answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::nanno_jikan_dayo_clicks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NannoJikanDayoClicks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
