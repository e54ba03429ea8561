use crate::database::dto::NewComment;
use crate::entity::comments;
use crate::entity::prelude::*;
use sea_orm::*;

/// コメントの保存処理（追記のみ）
pub struct CommentsRepository;

impl CommentsRepository {
    pub async fn insert(
        db: &DatabaseConnection,
        question_id: i32,
        comment: NewComment,
        ip_address: Option<String>,
    ) -> Result<comments::Model, DbErr> {
        let active = comments::ActiveModel {
            id: NotSet,
            question_id: Set(question_id),
            content: Set(comment.content),
            commenter_name: Set(comment.commenter_name),
            ip_address: Set(ip_address),
            created_at: Set(chrono::Utc::now()),
        };

        active.insert(db).await
    }

    /// 指定した質問のコメント（古い順）
    pub async fn find_by_question(
        db: &DatabaseConnection,
        question_id: i32,
    ) -> Result<Vec<comments::Model>, DbErr> {
        Comments::find()
            .filter(comments::Column::QuestionId.eq(question_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(db)
            .await
    }
}
