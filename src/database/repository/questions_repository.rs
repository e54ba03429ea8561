//! 質問の保存処理とフィード検索
//!
//! `FeedQuery` を一度だけ `Condition` に変換し、件数と一ページ分の取得の両方に同じ条件を使う。

use crate::database::dto::{
    FeedPage, NewQuestion, QuestionDetail, QuestionSummary, ReactionCounts, SiblingIds,
};
use crate::database::repository::answers_repository::AnswersRepository;
use crate::database::repository::comments_repository::CommentsRepository;
use crate::database::repository::reactions_repository::{ReactionKind, ReactionsRepository};
use crate::entity::prelude::*;
use crate::entity::questions::{self, QuestionStatus};
use crate::entity::{likes, nanno_jikan_dayo_clicks};
use crate::feed::{CategoryFilter, FeedQuery, FeedSort, SiblingAnchor};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;

/// 状態変更の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Updated(questions::Model),
    /// 回答の有無と食い違う変更は受け付けない
    Conflicts { answer_count: u64 },
}

/// LIKE のワイルドカードをエスケープし、小文字化して部分一致のパターンにする
///
/// 列側の `LOWER()` と同じ畳み込みにそろえる。SQLite の `LOWER()` は ASCII しか変換しないので、
/// 全角英字やアクセント付き文字はそのまま残す。
pub fn like_pattern(keyword: &str, backend: DbBackend) -> String {
    let folded = match backend {
        DbBackend::Sqlite => keyword.to_ascii_lowercase(),
        _ => keyword.to_lowercase(),
    };

    let mut escaped = String::with_capacity(folded.len() + 2);
    escaped.push('%');
    for ch in folded.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// 絞り込み条件を組み立てる
///
/// - カテゴリは完全一致。定義外の値は何にも一致しない
/// - 検索語はそれぞれタイトルか本文のどちらかに含まれていればよく、全語を AND で結ぶ
pub fn feed_condition(query: &FeedQuery, backend: DbBackend) -> Condition {
    let mut condition = Condition::all();

    condition = match query.category {
        CategoryFilter::Any => condition,
        CategoryFilter::Only(category) => condition.add(questions::Column::Category.eq(category)),
        CategoryFilter::NoMatch => condition.add(Expr::val(1).eq(0)),
    };

    for keyword in &query.keywords {
        let pattern = like_pattern(keyword, backend);
        condition = condition.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((Questions, questions::Column::Title))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((Questions, questions::Column::Content))))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    condition
}

/// 質問の保存処理
pub struct QuestionsRepository;

impl QuestionsRepository {
    // ==================== 作成・取得 ====================

    pub async fn insert(
        db: &DatabaseConnection,
        question: NewQuestion,
    ) -> Result<questions::Model, DbErr> {
        let now = chrono::Utc::now();

        let active = questions::ActiveModel {
            id: NotSet,
            title: Set(question.title),
            content: Set(question.content),
            category: Set(Some(question.category)),
            status: Set(QuestionStatus::Pending),
            submitter_nickname: Set(question.submitter_nickname),
            notification_token: Set(question.notification_token),
            admin_conclusion: Set(None),
            admin_conclusion_updated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active.insert(db).await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<questions::Model>, DbErr> {
        Questions::find_by_id(id).one(db).await
    }

    pub async fn exists(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        Ok(Questions::find_by_id(id).count(db).await? > 0)
    }

    /// 回答・コメント・リアクション件数つきの詳細
    pub async fn find_detail(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<QuestionDetail>, DbErr> {
        let Some(question) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };

        let answers = AnswersRepository::find_by_question(db, id).await?;
        let comments = CommentsRepository::find_by_question(db, id).await?;
        let count = ReactionCounts {
            likes: ReactionsRepository::count(db, ReactionKind::Like, id).await?,
            nanno_jikan_dayo_clicks: ReactionsRepository::count(
                db,
                ReactionKind::NannoJikanDayo,
                id,
            )
            .await?,
        };

        Ok(Some(QuestionDetail {
            question,
            answers,
            comments,
            count,
        }))
    }

    /// 通知トークンから質問を探す（認証なしで自分の質問の状態を知るため）
    pub async fn find_by_notification_token(
        db: &DatabaseConnection,
        token: &str,
    ) -> Result<Option<questions::Model>, DbErr> {
        Questions::find()
            .filter(questions::Column::NotificationToken.eq(token))
            .order_by_desc(questions::Column::CreatedAt)
            .one(db)
            .await
    }

    /// 管理画面用：状態で絞り込み、新しい順
    pub async fn find_by_status(
        db: &DatabaseConnection,
        status: Option<QuestionStatus>,
    ) -> Result<Vec<questions::Model>, DbErr> {
        let mut query = Questions::find();
        if let Some(status) = status {
            query = query.filter(questions::Column::Status.eq(status));
        }
        query
            .order_by_desc(questions::Column::CreatedAt)
            .order_by_desc(questions::Column::Id)
            .all(db)
            .await
    }

    // ==================== フィード ====================

    /// 絞り込み・検索・並び替え・ページ分割をまとめて行う
    pub async fn list_feed(db: &DatabaseConnection, query: &FeedQuery) -> Result<FeedPage, DbErr> {
        let condition = feed_condition(query, db.get_database_backend());

        let total_count = Questions::find().filter(condition.clone()).count(db).await?;

        let base = Questions::find().filter(condition);
        let sorted = match query.sort {
            FeedSort::CreatedAt => base.order_by_desc(questions::Column::CreatedAt),
            FeedSort::Likes => base
                .join(JoinType::LeftJoin, questions::Relation::Likes.def())
                .group_by(questions::Column::Id)
                .order_by(Expr::col((Likes, likes::Column::Id)).count(), Order::Desc),
            FeedSort::NannoTokis => base
                .join(JoinType::LeftJoin, questions::Relation::NannoJikanDayoClicks.def())
                .group_by(questions::Column::Id)
                .order_by(
                    Expr::col((NannoJikanDayoClicks, nanno_jikan_dayo_clicks::Column::Id)).count(),
                    Order::Desc,
                ),
        };

        // 同順位はページをまたいでも順序がぶれないよう id の降順で固定する
        let rows = sorted
            .order_by_desc(questions::Column::Id)
            .offset(query.offset())
            .limit(query.limit)
            .all(db)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|q| q.id).collect();
        let like_counts = ReactionsRepository::batch_count(db, ReactionKind::Like, &ids).await?;
        let click_counts =
            ReactionsRepository::batch_count(db, ReactionKind::NannoJikanDayo, &ids).await?;

        let questions = rows
            .into_iter()
            .map(|question| QuestionSummary {
                like_count: like_counts.get(&question.id).copied().unwrap_or(0),
                nanno_jikan_dayo_count: click_counts.get(&question.id).copied().unwrap_or(0),
                question,
            })
            .collect();

        Ok(FeedPage {
            questions,
            total_count,
            page: query.page,
            limit: query.limit,
        })
    }

    /// 作成日時で見た直前・直後の質問 ID（絞り込みとは無関係に全件から探す）
    pub async fn find_sibling_ids(
        db: &DatabaseConnection,
        anchor: SiblingAnchor,
    ) -> Result<SiblingIds, DbErr> {
        let previous_question_id = Questions::find()
            .select_only()
            .column(questions::Column::Id)
            .filter(questions::Column::CreatedAt.lt(anchor.created_at))
            .filter(questions::Column::Id.ne(anchor.id))
            .order_by_desc(questions::Column::CreatedAt)
            .order_by_desc(questions::Column::Id)
            .into_tuple::<i32>()
            .one(db)
            .await?;

        let next_question_id = Questions::find()
            .select_only()
            .column(questions::Column::Id)
            .filter(questions::Column::CreatedAt.gt(anchor.created_at))
            .filter(questions::Column::Id.ne(anchor.id))
            .order_by_asc(questions::Column::CreatedAt)
            .order_by_asc(questions::Column::Id)
            .into_tuple::<i32>()
            .one(db)
            .await?;

        Ok(SiblingIds {
            previous_question_id,
            next_question_id,
        })
    }

    // ==================== 管理操作 ====================

    /// 状態を直接変更する
    ///
    /// answered は回答が一件以上あるとき、pending は回答が無いときだけ受け付ける。
    pub async fn update_status(
        db: &DatabaseConnection,
        id: i32,
        status: QuestionStatus,
    ) -> Result<StatusChange, DbErr> {
        let existing = Self::find_by_id(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound(format!("質問 {} が見つかりません", id)))?;

        let answer_count = AnswersRepository::count_by_question(db, id).await?;
        let consistent = match status {
            QuestionStatus::Answered => answer_count > 0,
            QuestionStatus::Pending => answer_count == 0,
        };
        if !consistent {
            return Ok(StatusChange::Conflicts { answer_count });
        }

        let mut active: questions::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(chrono::Utc::now());
        Ok(StatusChange::Updated(active.update(db).await?))
    }

    /// 結論を設定・消去する
    ///
    /// 本文と更新時刻は一つの UPDATE で同時に書くので、片方だけ残ることはない。
    pub async fn set_conclusion(
        db: &DatabaseConnection,
        id: i32,
        conclusion: Option<String>,
    ) -> Result<questions::Model, DbErr> {
        let existing = Self::find_by_id(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound(format!("質問 {} が見つかりません", id)))?;

        let now = chrono::Utc::now();
        let stamped_at = conclusion.as_ref().map(|_| now);

        let mut active: questions::ActiveModel = existing.into();
        active.admin_conclusion = Set(conclusion);
        active.admin_conclusion_updated_at = Set(stamped_at);
        active.updated_at = Set(now);

        active.update(db).await
    }

    /// 質問を削除する（子テーブルは外部キーで連動削除）
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<DeleteResult, DbErr> {
        Questions::delete_by_id(id).exec(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards_and_lowercases() {
        assert_eq!(like_pattern("AI", DbBackend::Sqlite), "%ai%");
        assert_eq!(like_pattern("100%", DbBackend::Sqlite), "%100\\%%");
        assert_eq!(like_pattern("a_b", DbBackend::Sqlite), "%a\\_b%");
        assert_eq!(like_pattern("猫", DbBackend::Sqlite), "%猫%");
    }

    #[test]
    fn sqlite_pattern_keeps_non_ascii_letters_as_typed() {
        assert_eq!(like_pattern("ＡＩ", DbBackend::Sqlite), "%ＡＩ%");
        assert_eq!(like_pattern("Émile", DbBackend::Sqlite), "%Émile%");
        assert_eq!(like_pattern("Émile", DbBackend::Postgres), "%émile%");
    }
}
