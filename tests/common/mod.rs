#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use soudanshitsu_lib::build_router;
use soudanshitsu_lib::config::Config;
use soudanshitsu_lib::database::connection::establish_connection;
use soudanshitsu_lib::entity::questions::{self, Category, QuestionStatus};
use soudanshitsu_lib::state::AppState;
use soudanshitsu_lib::upload::{ImageHost, ImageUpload, UploadError};

pub const ADMIN_PASSWORD: &str = "test-admin";

/// 受け取った画像のファイル名から URL を作るだけの画像ホスト
pub struct FakeImageHost;

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        Ok(format!("https://images.test/{}", image.file_name))
    }
}

/// 常に失敗する画像ホスト
pub struct FailingImageHost;

#[async_trait]
impl ImageHost for FailingImageHost {
    async fn upload(&self, _image: ImageUpload) -> Result<String, UploadError> {
        Err(UploadError::Rejected("quota exceeded".to_string()))
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(FakeImageHost)).await
}

/// インメモリ SQLite（接続一本）にマイグレーションを流してルーターを作る
pub async fn spawn_app_with(image_host: Arc<dyn ImageHost>) -> TestApp {
    let config = Config::for_database("sqlite::memory:", ADMIN_PASSWORD);
    let db = establish_connection(&config).await.expect("connect");
    migration::Migrator::up(&db, None).await.expect("migrate");

    let state = AppState::with_image_host(db.clone(), config, image_host);
    TestApp {
        db,
        router: build_router(state),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    /// 発信元ヘッダーつきの POST（本文なし）
    pub async fn post_from(&self, uri: &str, origin: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(origin) = origin {
            builder = builder.header("x-forwarded-for", origin);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = match body {
            Some(body) => json_request(method, uri, body),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        };
        request
            .headers_mut()
            .insert("x-admin-password", ADMIN_PASSWORD.parse().expect("header"));
        self.send(request).await
    }

    /// 回答フォームを multipart で送る。image は (ファイル名, 中身)
    pub async fn post_answer(
        &self,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let boundary = "----soudanshitsu-test-boundary";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/answers")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("x-admin-password", ADMIN_PASSWORD)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// 作成日時を指定して質問を直接入れる
    pub async fn seed_question(
        &self,
        title: &str,
        content: &str,
        category: Category,
        created_at: DateTime<Utc>,
    ) -> questions::Model {
        questions::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            category: Set(Some(category)),
            status: Set(QuestionStatus::Pending),
            submitter_nickname: Set("匿名さん".to_string()),
            notification_token: Set(None),
            admin_conclusion: Set(None),
            admin_conclusion_updated_at: Set(None),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("seed question")
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// クエリ文字列用のエンコード
pub fn enc(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// 基準時刻から n 分後
pub fn minutes(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().expect("time") + Duration::minutes(n)
}
