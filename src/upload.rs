//! 回答画像の外部ホスティング
//!
//! 管理者が回答に画像を添付したときだけ呼ばれる。アップロードに失敗したら回答は作らない。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::CloudinaryConfig;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("image host is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image host rejected the upload: {0}")]
    Rejected(String),
}

/// アップロードする画像
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// 公開 URL を返す
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError>;
}

/// Cloudinary の署名付きアップロード
pub struct CloudinaryHost {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    error: Option<CloudinaryErrorBody>,
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }
}

/// 署名対象のパラメータはキーのアルファベット順に並べ、末尾に秘密鍵をつなげる
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) else {
            return Err(UploadError::NotConfigured);
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            api_secret,
        );

        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", api_key.to_string())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let url = format!("https://api.cloudinary.com/v1_1/{}/image/upload", cloud_name);
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        let body: CloudinaryResponse = response.json().await?;

        match (body.secure_url, body.error) {
            (Some(secure_url), None) if status.is_success() && !secure_url.is_empty() => {
                log::info!("画像をアップロードしました: {}", secure_url);
                Ok(secure_url)
            }
            (_, Some(err)) => Err(UploadError::Rejected(err.message)),
            _ => Err(UploadError::Rejected(format!(
                "unexpected response (status {})",
                status
            ))),
        }
    }
}
