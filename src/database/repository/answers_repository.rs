//! 回答の保存処理
//!
//! 回答の保存と質問の状態更新は一つのトランザクションで行う。
//! どちらかが失敗すれば両方とも巻き戻るので「回答はあるのに pending」という状態は生まれない。

use crate::entity::answers::{self, Responder};
use crate::entity::prelude::*;
use crate::entity::questions::{self, QuestionStatus};
use sea_orm::*;

/// 保存する回答の内容（画像は URL 化済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDraft {
    pub content: String,
    pub responder: Responder,
    pub link_url: Option<String>,
    pub image_url: Option<String>,
}

pub struct AnswersRepository;

impl AnswersRepository {
    /// 回答を保存し、質問を answered にする
    ///
    /// すでに回答がある場合は新しい行を作らず、最初の回答を書き換える。
    pub async fn upsert_for_question(
        db: &DatabaseConnection,
        question_id: i32,
        draft: AnswerDraft,
    ) -> Result<answers::Model, DbErr> {
        let txn = db.begin().await?;
        let now = chrono::Utc::now();

        if Questions::find_by_id(question_id).one(&txn).await?.is_none() {
            return Err(DbErr::RecordNotFound(format!(
                "質問 {} が見つかりません",
                question_id
            )));
        }

        let existing = Answers::find()
            .filter(answers::Column::QuestionId.eq(question_id))
            .order_by_asc(answers::Column::CreatedAt)
            .order_by_asc(answers::Column::Id)
            .one(&txn)
            .await?;

        let answer = match existing {
            Some(first) => {
                let mut active: answers::ActiveModel = first.into();
                active.content = Set(draft.content);
                active.responder = Set(draft.responder);
                active.link_url = Set(draft.link_url);
                active.image_url = Set(draft.image_url);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                answers::ActiveModel {
                    id: NotSet,
                    question_id: Set(question_id),
                    content: Set(draft.content),
                    image_url: Set(draft.image_url),
                    link_url: Set(draft.link_url),
                    responder: Set(draft.responder),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        questions::ActiveModel {
            id: Set(question_id),
            status: Set(QuestionStatus::Answered),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        Ok(answer)
    }

    /// 指定した質問の回答（作成順）
    pub async fn find_by_question(
        db: &DatabaseConnection,
        question_id: i32,
    ) -> Result<Vec<answers::Model>, DbErr> {
        Answers::find()
            .filter(answers::Column::QuestionId.eq(question_id))
            .order_by_asc(answers::Column::CreatedAt)
            .order_by_asc(answers::Column::Id)
            .all(db)
            .await
    }

    pub async fn count_by_question(db: &DatabaseConnection, question_id: i32) -> Result<u64, DbErr> {
        Answers::find()
            .filter(answers::Column::QuestionId.eq(question_id))
            .count(db)
            .await
    }
}
