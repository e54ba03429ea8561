use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;

/// 管理画面の共有パスワード既定値（開発用）
const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// 明示された接続文字列。無ければ data_dir 内の SQLite ファイルを使う
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub max_connections: u32,
    pub admin_password: String,
    pub cors_allow_origin: Option<String>,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let admin_password = var("ADMIN_PASSWORD").unwrap_or_else(|| {
            log::warn!("ADMIN_PASSWORD not set, using the development default");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let cloudinary = CloudinaryConfig {
            cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            api_key: var("CLOUDINARY_API_KEY"),
            api_secret: var("CLOUDINARY_API_SECRET"),
            folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| "ai_qna_answers".to_string()),
        };
        if cloudinary.cloud_name.is_none()
            || cloudinary.api_key.is_none()
            || cloudinary.api_secret.is_none()
        {
            log::warn!("Cloudinary credentials are incomplete. Image uploads will fail.");
        }

        Ok(Self {
            port: try_load("PORT", "3000")?,
            database_url: var("DATABASE_URL"),
            data_dir: PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
            admin_password,
            cors_allow_origin: var("CORS_ALLOW_ORIGIN"),
            cloudinary,
        })
    }

    /// テストや一時起動用の設定
    pub fn for_database(database_url: impl Into<String>, admin_password: impl Into<String>) -> Self {
        Self {
            port: 0,
            database_url: Some(database_url.into()),
            data_dir: PathBuf::from("data"),
            max_connections: 1,
            admin_password: admin_password.into(),
            cors_allow_origin: None,
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

/// 空文字は未設定と同じ扱い
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })
}
