use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::seq::SliceRandom;
use serde_json::json;

use crate::database::dto::{
    AdminQuestionsQuery, AnswerForm, ConclusionRequest, CreateCommentRequest,
    CreateQuestionRequest, LikeResponse, LogLevelRequest, NannoJikanDayoResponse,
    NotificationQuery, NotificationStatus, QuestionsQuery, UpdateStatusRequest,
};
use crate::database::repository::{
    answers_repository::{AnswerDraft, AnswersRepository},
    comments_repository::CommentsRepository,
    questions_repository::{QuestionsRepository, StatusChange},
    reactions_repository::{ReactionKind, ReactionOutcome, ReactionsRepository},
};
use crate::entity::questions::QuestionStatus;
use crate::error::AppError;
use crate::feed::FeedRequest;
use crate::origin::ClientOrigin;
use crate::state::AppState;
use crate::upload::ImageUpload;
use crate::utils::logs::{current_log_level, set_log_level};

type AppResult<T> = Result<T, AppError>;

/// 管理画面の認証ヘッダー
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// 「なんの時間だよ」を押した人に返す一言
const HUMOR_MESSAGES: [&str; 10] = [
    "シャンプー切れたことに気付く時間だよ！",
    "プテラノドン復活を待つ時間だよ！",
    "お前が世界線を変える時間だよ！",
    "メンタルもやしを鍛える時間だよ！",
    "ダシ昆布を出汁に戻す時間だよ！",
    "北風がパスタを乾かす時間だよ！",
    "Wi-Fiが恋する時間だよ！",
    "左足だけ靴下脱ぐ時間だよ！",
    "スプーンを曲げずに曲がるのを待つ時間だよ！",
    "タピオカが目覚める時間だよ！",
];

fn pick_humor() -> String {
    HUMOR_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(HUMOR_MESSAGES[0])
        .to_string()
}

/// パスの ID を数値に変換する
fn parse_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::Validation("質問 ID が不正です".to_string()))
}

/// JSON の形が崩れていても共通のエラー形式で返す
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(format!("リクエストの形式が不正です: {}", e.body_text())))
}

async fn ensure_question_exists(state: &AppState, id: i32) -> AppResult<()> {
    if QuestionsRepository::exists(&state.db, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("質問が見つかりません".to_string()))
    }
}

// ==================== 質問 ====================

/// 一覧（絞り込み・検索・並び替え・ページ分割）、または前後の質問 ID
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionsQuery>,
) -> AppResult<Response> {
    match query.into_request()? {
        FeedRequest::Siblings(anchor) => {
            let siblings = QuestionsRepository::find_sibling_ids(&state.db, anchor).await?;
            Ok(Json(siblings).into_response())
        }
        FeedRequest::Listing(feed) => {
            let page = QuestionsRepository::list_feed(&state.db, &feed).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// 質問を投稿する
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let question = json_body(payload)?.validate()?;
    let created = QuestionsRepository::insert(&state.db, question).await?;
    log::info!("質問 {} を受け付けました", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// 質問の詳細
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    QuestionsRepository::find_detail(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("質問が見つかりません".to_string()))
}

// ==================== コメント ====================

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    origin: ClientOrigin,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let comment = json_body(payload)?.validate()?;
    ensure_question_exists(&state, id).await?;

    let created =
        CommentsRepository::insert(&state.db, id, comment, origin.recorded_address()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ==================== リアクション ====================

/// 記録できれば件数を返し、二度目なら 409 にする
async fn react(state: &AppState, id: i32, origin: &ClientOrigin, kind: ReactionKind) -> AppResult<u64> {
    ensure_question_exists(state, id).await?;

    match ReactionsRepository::record(&state.db, kind, id, origin.dedup_key()).await? {
        ReactionOutcome::Recorded { count } => Ok(count),
        ReactionOutcome::Duplicate { count } => {
            log::debug!("質問 {} への {:?} は記録済み", id, kind);
            Err(AppError::DuplicateReaction { kind, count })
        }
    }
}

pub async fn like_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    origin: ClientOrigin,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let like_count = react(&state, id, &origin, ReactionKind::Like).await?;
    Ok((
        StatusCode::CREATED,
        Json(LikeResponse {
            message: "いいねしました".to_string(),
            like_count,
        }),
    ))
}

pub async fn nanno_jikan_dayo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    origin: ClientOrigin,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let count = react(&state, id, &origin, ReactionKind::NannoJikanDayo).await?;
    Ok((
        StatusCode::CREATED,
        Json(NannoJikanDayoResponse {
            message: "なんの時間だよ！".to_string(),
            humor: pick_humor(),
            nanno_jikan_dayo_click_count: count,
        }),
    ))
}

// ==================== 通知 ====================

/// 投稿時に受け取ったトークンで回答状況を確認する
pub async fn notification_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<impl IntoResponse> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("通知トークンを指定してください".to_string()))?;

    let question = QuestionsRepository::find_by_notification_token(&state.db, token.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("このトークンの質問は見つかりません".to_string()))?;

    Ok(Json(NotificationStatus {
        id: question.id,
        title: question.title,
        status: question.status,
    }))
}

// ==================== 管理 ====================

/// 管理ルートの前段で共有パスワードを確かめる
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let provided = request
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided != Some(state.config.admin_password.as_str()) {
        log::warn!("管理 API への認証に失敗しました: {}", request.uri().path());
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

pub async fn admin_list_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuestionsQuery>,
) -> AppResult<impl IntoResponse> {
    let status = query.status_filter()?;
    let questions = QuestionsRepository::find_by_status(&state.db, status).await?;
    Ok(Json(questions))
}

/// multipart のフォームを読み取る。画像は "image" フィールド
async fn read_answer_form(mut multipart: Multipart) -> AppResult<AnswerForm> {
    let mut form = AnswerForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("フォームを読み取れません: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("画像を読み取れません: {}", e)))?;
            form.image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("フォームを読み取れません: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// 回答を登録（既にあれば更新）し、質問を answered にする
pub async fn admin_upsert_answer(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let input = read_answer_form(multipart).await?.validate()?;
    ensure_question_exists(&state, input.question_id).await?;

    // 書き込みより先にアップロードし、失敗したら何も保存しない
    let image_url = match input.image {
        Some(image) => Some(state.image_host.upload(image).await?),
        None => input.existing_image_url,
    };

    let answer = AnswersRepository::upsert_for_question(
        &state.db,
        input.question_id,
        AnswerDraft {
            content: input.content,
            responder: input.responder,
            link_url: input.link_url,
            image_url,
        },
    )
    .await?;

    log::info!("質問 {} に回答しました（回答 {}）", answer.question_id, answer.id);
    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn admin_update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let request = json_body(payload)?;
    let status = QuestionStatus::parse(request.status.trim())
        .ok_or_else(|| AppError::Validation(format!("不明なステータスです: {}", request.status)))?;

    match QuestionsRepository::update_status(&state.db, id, status).await? {
        StatusChange::Updated(question) => Ok(Json(question)),
        StatusChange::Conflicts { answer_count } => Err(AppError::Validation(format!(
            "回答 {} 件の質問を {} にはできません",
            answer_count,
            status.as_str()
        ))),
    }
}

pub async fn admin_set_conclusion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ConclusionRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let conclusion = json_body(payload)?.validate()?;
    let question = QuestionsRepository::set_conclusion(&state.db, id, conclusion).await?;
    Ok(Json(question))
}

pub async fn admin_clear_conclusion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let question = QuestionsRepository::set_conclusion(&state.db, id, None).await?;
    Ok(Json(question))
}

/// 質問を削除する。回答・コメント・リアクションも一緒に消える
pub async fn admin_delete_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let result = QuestionsRepository::delete(&state.db, id).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("質問 {} が見つかりません", id)));
    }

    log::info!("質問 {} を削除しました", id);
    Ok(Json(json!({ "message": format!("質問 {} を削除しました", id) })))
}

pub async fn admin_get_log_level() -> impl IntoResponse {
    Json(json!({ "level": current_log_level() }))
}

pub async fn admin_set_log_level(
    payload: Result<Json<LogLevelRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let level = set_log_level(&request.level).map_err(AppError::Validation)?;
    Ok(Json(json!({ "level": level })))
}
