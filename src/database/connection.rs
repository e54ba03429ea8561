use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, RuntimeErr};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::config::Config;

/// DATABASE_URL が無いときに data_dir 内へ作る SQLite ファイル名
const DB_FILE_NAME: &str = "soudanshitsu.db";

/// 既定の SQLite ファイルのパス
pub fn get_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// データベースのディレクトリを用意する
pub fn ensure_db_dir_exists(db_path: &Path) -> Result<(), String> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("データベースのディレクトリを作成できません: {}", e))?;
    }
    Ok(())
}

/// 接続文字列を決める。明示された URL が優先
pub fn resolve_database_url(config: &Config) -> Result<String, DbErr> {
    if let Some(url) = &config.database_url {
        return Ok(url.clone());
    }

    let db_path = get_db_path(&config.data_dir);
    ensure_db_dir_exists(&db_path).map_err(|e| DbErr::Conn(RuntimeErr::Internal(e)))?;

    // from_file_path は絶対パスしか受け付けない
    let absolute = std::path::absolute(&db_path).map_err(|e| {
        DbErr::Conn(RuntimeErr::Internal(format!(
            "Invalid database path {}: {}",
            db_path.display(),
            e
        )))
    })?;
    let db_url = Url::from_file_path(&absolute).map_err(|_| {
        DbErr::Conn(RuntimeErr::Internal(format!(
            "Invalid database path: {}",
            absolute.display()
        )))
    })?;

    Ok(format!("sqlite:{}?mode=rwc", db_url.path()))
}

/// Establish a SeaORM database connection.
pub async fn establish_connection(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let connection_string = resolve_database_url(config)?;

    let mut options = ConnectOptions::new(connection_string);
    options
        .max_connections(config.max_connections.max(1))
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(cfg!(debug_assertions))
        .sqlx_logging_level(log::LevelFilter::Debug);

    log::info!("データベースに接続します");
    Database::connect(options).await
}

/// データベース接続を閉じる
pub async fn close_connection(conn: DatabaseConnection) -> Result<(), DbErr> {
    conn.close().await?;
    Ok(())
}
