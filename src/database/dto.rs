//! データ転送オブジェクト (DTO)
//!
//! HTTP で受け取る・返す形の定義と、境界での入力検証。
//! 検証はすべて DB に触れる前に済ませる。

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::answers::{self, Responder};
use crate::entity::comments;
use crate::entity::questions::{self, Category, QuestionStatus};
use crate::error::AppError;
use crate::feed::{FeedQuery, FeedRequest, SiblingAnchor};
use crate::upload::ImageUpload;

// ==================== 長さ制限 ====================

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 2000;
pub const COMMENT_MAX_CHARS: usize = 500;
pub const CONCLUSION_MAX_CHARS: usize = 500;

/// 質問者の表示名が空のときの既定値
pub const ANONYMOUS_NICKNAME: &str = "匿名さん";
/// コメント投稿者名が空のときの既定値
pub const ANONYMOUS_COMMENTER: &str = "匿名";

/// 補助関数：Option<Option<T>> のデシリアライズ
/// 「フィールドなし」と「明示的な null」を区別する
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{}は{}文字以内で入力してください",
            field, max
        )));
    }
    Ok(())
}

// ==================== 質問一覧 ====================

/// GET /api/questions のクエリ文字列
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub current_question_id: Option<String>,
    pub current_question_created_at: Option<String>,
}

impl QuestionsQuery {
    /// 前後ナビゲーションの基準点が揃っていればそちらを優先する
    pub fn into_request(self) -> Result<FeedRequest, AppError> {
        if let (Some(id), Some(created_at)) = (
            self.current_question_id.as_deref(),
            self.current_question_created_at.as_deref(),
        ) {
            return SiblingAnchor::parse(id, created_at)
                .map(FeedRequest::Siblings)
                .map_err(AppError::Validation);
        }

        Ok(FeedRequest::Listing(FeedQuery::from_params(
            self.category.as_deref(),
            self.search.as_deref(),
            self.sort.as_deref(),
            self.page.as_deref(),
        )))
    }
}

/// 一覧の一件。件数は子テーブルから数えた値
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    #[serde(flatten)]
    pub question: questions::Model,
    pub like_count: u64,
    pub nanno_jikan_dayo_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub questions: Vec<QuestionSummary>,
    pub total_count: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingIds {
    pub previous_question_id: Option<i32>,
    pub next_question_id: Option<i32>,
}

// ==================== 質問詳細 ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCounts {
    pub likes: u64,
    pub nanno_jikan_dayo_clicks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: questions::Model,
    /// 作成順。公開画面は先頭の一件だけを使う
    pub answers: Vec<answers::Model>,
    /// 古い順
    pub comments: Vec<comments::Model>,
    #[serde(rename = "_count")]
    pub count: ReactionCounts,
}

// ==================== 質問投稿 ====================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub notification_token: Option<String>,
    pub submitter_nickname: Option<String>,
}

/// 検証済みの質問
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub notification_token: Option<String>,
    pub submitter_nickname: String,
}

impl CreateQuestionRequest {
    pub fn validate(self) -> Result<NewQuestion, AppError> {
        let (Some(title), Some(content)) = (non_blank(self.title), self.content) else {
            return Err(AppError::Validation(
                "タイトルと本文は必須です".to_string(),
            ));
        };
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "タイトルと本文は必須です".to_string(),
            ));
        }
        check_len("タイトル", &title, TITLE_MAX_CHARS)?;
        check_len("本文", &content, CONTENT_MAX_CHARS)?;

        let category = self
            .category
            .as_deref()
            .and_then(Category::parse)
            .ok_or_else(|| AppError::Validation("有効なカテゴリーを選択してください。".to_string()))?;

        Ok(NewQuestion {
            title,
            content,
            category,
            notification_token: non_blank(self.notification_token),
            submitter_nickname: non_blank(self.submitter_nickname)
                .unwrap_or_else(|| ANONYMOUS_NICKNAME.to_string()),
        })
    }
}

// ==================== コメント ====================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    pub commenter_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub commenter_name: String,
}

impl CreateCommentRequest {
    pub fn validate(self) -> Result<NewComment, AppError> {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("コメントを入力してください".to_string()))?;
        check_len("コメント", &content, COMMENT_MAX_CHARS)?;

        Ok(NewComment {
            content,
            commenter_name: non_blank(self.commenter_name)
                .unwrap_or_else(|| ANONYMOUS_COMMENTER.to_string()),
        })
    }
}

// ==================== リアクション ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub like_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NannoJikanDayoResponse {
    pub message: String,
    /// ボタンを押した人に見せる一言
    pub humor: String,
    pub nanno_jikan_dayo_click_count: u64,
}

// ==================== 通知 ====================

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationStatus {
    pub id: i32,
    pub title: String,
    pub status: QuestionStatus,
}

// ==================== 管理: 回答 ====================

/// multipart で受け取った回答フォーム（画像以外はテキスト）
#[derive(Debug, Clone, Default)]
pub struct AnswerForm {
    pub fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

/// 検証済みの回答
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub question_id: i32,
    pub content: String,
    pub responder: Responder,
    pub link_url: Option<String>,
    pub existing_image_url: Option<String>,
    pub image: Option<ImageUpload>,
}

impl AnswerForm {
    fn field(&self, name: &str) -> Option<String> {
        non_blank(self.fields.get(name).cloned())
    }

    pub fn validate(self) -> Result<AnswerInput, AppError> {
        let (Some(question_id), Some(content), Some(responder)) = (
            self.field("question_id"),
            self.field("content"),
            self.field("responder"),
        ) else {
            return Err(AppError::Validation(
                "question_id・content・responder は必須です".to_string(),
            ));
        };

        let question_id = question_id
            .parse::<i32>()
            .map_err(|_| AppError::Validation("question_id の形式が不正です".to_string()))?;
        let responder = Responder::parse(&responder)
            .ok_or_else(|| AppError::Validation("回答者は「俺」か「たま」です".to_string()))?;

        Ok(AnswerInput {
            question_id,
            content,
            responder,
            link_url: self.field("link_url"),
            existing_image_url: self.field("existing_image_url"),
            image: self.image.filter(|img| !img.bytes.is_empty()),
        })
    }
}

// ==================== 管理: 状態と結論 ====================

#[derive(Debug, Clone, Deserialize)]
pub struct AdminQuestionsQuery {
    pub status: Option<String>,
}

impl AdminQuestionsQuery {
    pub fn status_filter(&self) -> Result<Option<QuestionStatus>, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => QuestionStatus::parse(s)
                .map(Some)
                .ok_or_else(|| AppError::Validation(format!("不明なステータスです: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConclusionRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub admin_conclusion: Option<Option<String>>,
}

impl ConclusionRequest {
    /// Some(text) は設定、None は消去
    pub fn validate(self) -> Result<Option<String>, AppError> {
        let Some(value) = self.admin_conclusion else {
            return Err(AppError::Validation(
                "admin_conclusion を指定してください".to_string(),
            ));
        };
        match non_blank(value) {
            None => Ok(None),
            Some(text) => {
                check_len("結論", &text, CONCLUSION_MAX_CHARS)?;
                Ok(Some(text))
            }
        }
    }
}

// ==================== ログ ====================

#[derive(Debug, Clone, Deserialize)]
pub struct LogLevelRequest {
    pub level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_request() -> CreateQuestionRequest {
        CreateQuestionRequest {
            title: Some("AIは夢を見るか".into()),
            content: Some("ずっと気になっています".into()),
            category: Some("AI".into()),
            notification_token: Some("tok-1".into()),
            submitter_nickname: None,
        }
    }

    #[test]
    fn blank_nickname_defaults_to_anonymous() {
        let q = CreateQuestionRequest {
            submitter_nickname: Some("   ".into()),
            ..question_request()
        }
        .validate()
        .expect("valid question");
        assert_eq!(q.submitter_nickname, ANONYMOUS_NICKNAME);
        assert_eq!(q.category, Category::Ai);
    }

    #[test]
    fn missing_title_or_bad_category_is_rejected() {
        let no_title = CreateQuestionRequest {
            title: Some(" ".into()),
            ..question_request()
        };
        assert!(matches!(no_title.validate(), Err(AppError::Validation(_))));

        let bad_category = CreateQuestionRequest {
            category: Some("料理".into()),
            ..question_request()
        };
        assert!(matches!(bad_category.validate(), Err(AppError::Validation(_))));

        let no_category = CreateQuestionRequest {
            category: None,
            ..question_request()
        };
        assert!(matches!(no_category.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn title_length_is_counted_in_chars() {
        let ok = CreateQuestionRequest {
            title: Some("あ".repeat(TITLE_MAX_CHARS)),
            ..question_request()
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateQuestionRequest {
            title: Some("あ".repeat(TITLE_MAX_CHARS + 1)),
            ..question_request()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn comment_rules() {
        let c = CreateCommentRequest {
            content: Some("なるほど".into()),
            commenter_name: None,
        }
        .validate()
        .expect("valid comment");
        assert_eq!(c.commenter_name, ANONYMOUS_COMMENTER);

        let empty = CreateCommentRequest {
            content: Some("  ".into()),
            commenter_name: None,
        };
        assert!(empty.validate().is_err());

        let long = CreateCommentRequest {
            content: Some("x".repeat(COMMENT_MAX_CHARS + 1)),
            commenter_name: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn conclusion_distinguishes_missing_null_and_text() {
        let missing: ConclusionRequest = serde_json::from_str("{}").expect("json");
        assert!(missing.validate().is_err());

        let null: ConclusionRequest =
            serde_json::from_str(r#"{"admin_conclusion": null}"#).expect("json");
        assert_eq!(null.validate().expect("clear"), None);

        let text: ConclusionRequest =
            serde_json::from_str(r#"{"admin_conclusion": "結論です"}"#).expect("json");
        assert_eq!(text.validate().expect("set"), Some("結論です".to_string()));

        let too_long = ConclusionRequest {
            admin_conclusion: Some(Some("z".repeat(CONCLUSION_MAX_CHARS + 1))),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn answer_form_requires_known_responder() {
        let mut form = AnswerForm::default();
        form.fields.insert("question_id".into(), "3".into());
        form.fields.insert("content".into(), "答えです".into());
        form.fields.insert("responder".into(), "たま".into());
        let input = form.clone().validate().expect("valid answer");
        assert_eq!(input.responder, Responder::Tama);
        assert_eq!(input.question_id, 3);

        form.fields.insert("responder".into(), "誰か".into());
        assert!(form.validate().is_err());
    }

    #[test]
    fn sibling_mode_takes_precedence_over_listing() {
        let query = QuestionsQuery {
            category: Some("AI".into()),
            page: Some("2".into()),
            current_question_id: Some("5".into()),
            current_question_created_at: Some("2025-06-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_request().expect("request"),
            FeedRequest::Siblings(_)
        ));

        let partial = QuestionsQuery {
            current_question_id: Some("5".into()),
            ..Default::default()
        };
        assert!(matches!(
            partial.into_request().expect("request"),
            FeedRequest::Listing(_)
        ));
    }
}
