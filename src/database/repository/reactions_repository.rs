//! リアクション（いいね・「なんの時間だよ」）の保存処理
//!
//! 一人一回の制限は (question_id, ip_address) のユニーク制約に任せる。
//! 事前に存在確認をしてから挿入すると同時リクエストで二重登録になるため、
//! ここでは挿入を試み、制約違反を「すでに押した」と解釈する。

use std::collections::HashMap;

use crate::entity::prelude::*;
use crate::entity::{likes, nanno_jikan_dayo_clicks};
use sea_orm::sea_query::Expr;
use sea_orm::*;

/// リアクションの種類。二つのテーブルは同じ形をしている
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    NannoJikanDayo,
}

impl ReactionKind {
    /// レスポンスで件数を返すときのキー名
    pub fn count_key(self) -> &'static str {
        match self {
            Self::Like => "likeCount",
            Self::NannoJikanDayo => "nannoJikanDayoClickCount",
        }
    }
}

/// 記録結果。どちらの場合も最新の件数を持つ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Recorded { count: u64 },
    Duplicate { count: u64 },
}

#[derive(Debug, FromQueryResult)]
struct QuestionCount {
    question_id: i32,
    count: i64,
}

/// ユニーク制約違反かどうか
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub struct ReactionsRepository;

impl ReactionsRepository {
    /// リアクションを一件記録する
    ///
    /// 質問の存在確認は呼び出し側で済ませておくこと。
    pub async fn record(
        db: &DatabaseConnection,
        kind: ReactionKind,
        question_id: i32,
        origin_key: String,
    ) -> Result<ReactionOutcome, DbErr> {
        let now = chrono::Utc::now();

        let inserted = match kind {
            ReactionKind::Like => likes::ActiveModel {
                id: NotSet,
                question_id: Set(question_id),
                ip_address: Set(Some(origin_key)),
                created_at: Set(now),
            }
            .insert(db)
            .await
            .map(|_| ()),
            ReactionKind::NannoJikanDayo => nanno_jikan_dayo_clicks::ActiveModel {
                id: NotSet,
                question_id: Set(question_id),
                ip_address: Set(Some(origin_key)),
                created_at: Set(now),
            }
            .insert(db)
            .await
            .map(|_| ()),
        };

        match inserted {
            Ok(()) => Ok(ReactionOutcome::Recorded {
                count: Self::count(db, kind, question_id).await?,
            }),
            Err(err) if is_unique_violation(&err) => Ok(ReactionOutcome::Duplicate {
                count: Self::count(db, kind, question_id).await?,
            }),
            Err(err) => Err(err),
        }
    }

    /// 件数は常に子テーブルの行数から数える
    pub async fn count(
        db: &DatabaseConnection,
        kind: ReactionKind,
        question_id: i32,
    ) -> Result<u64, DbErr> {
        match kind {
            ReactionKind::Like => {
                Likes::find()
                    .filter(likes::Column::QuestionId.eq(question_id))
                    .count(db)
                    .await
            }
            ReactionKind::NannoJikanDayo => {
                NannoJikanDayoClicks::find()
                    .filter(nanno_jikan_dayo_clicks::Column::QuestionId.eq(question_id))
                    .count(db)
                    .await
            }
        }
    }

    /// 複数の質問の件数をまとめて取得する（N+1 を避ける）
    ///
    /// リアクションが一件もない質問は結果に含まれない。
    pub async fn batch_count(
        db: &DatabaseConnection,
        kind: ReactionKind,
        question_ids: &[i32],
    ) -> Result<HashMap<i32, u64>, DbErr> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = match kind {
            ReactionKind::Like => {
                Likes::find()
                    .select_only()
                    .column(likes::Column::QuestionId)
                    .column_as(Expr::col((Likes, likes::Column::Id)).count(), "count")
                    .filter(likes::Column::QuestionId.is_in(question_ids.to_vec()))
                    .group_by(likes::Column::QuestionId)
                    .into_model::<QuestionCount>()
                    .all(db)
                    .await?
            }
            ReactionKind::NannoJikanDayo => {
                NannoJikanDayoClicks::find()
                    .select_only()
                    .column(nanno_jikan_dayo_clicks::Column::QuestionId)
                    .column_as(
                        Expr::col((NannoJikanDayoClicks, nanno_jikan_dayo_clicks::Column::Id))
                            .count(),
                        "count",
                    )
                    .filter(
                        nanno_jikan_dayo_clicks::Column::QuestionId.is_in(question_ids.to_vec()),
                    )
                    .group_by(nanno_jikan_dayo_clicks::Column::QuestionId)
                    .into_model::<QuestionCount>()
                    .all(db)
                    .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| (row.question_id, row.count.max(0) as u64))
            .collect())
    }
}
