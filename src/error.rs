use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::database::repository::reactions_repository::ReactionKind;
use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("管理者パスワードが正しくありません")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// 想定内の失敗。409 と最新の件数を返す
    #[error("すでにリアクション済みです")]
    DuplicateReaction { kind: ReactionKind, count: u64 },

    #[error("画像のアップロードに失敗しました: {0}")]
    Upstream(#[from] UploadError),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => AppError::NotFound(msg),
            DbErr::RecordNotUpdated => AppError::NotFound("対象の質問が見つかりません".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation(..) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::DuplicateReaction { .. } => StatusCode::CONFLICT,
            AppError::Upstream(..) | AppError::Database(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::DuplicateReaction { kind, count } => {
                json!({ "error": self.to_string(), kind.count_key(): count })
            }
            // 詳細はログにだけ残し、利用者には返さない
            AppError::Database(..) => {
                log::error!("{}", self);
                json!({ "error": "サーバー内部でエラーが発生しました" })
            }
            AppError::Upstream(..) => {
                log::error!("{}", self);
                json!({ "error": "画像のアップロードに失敗しました" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
