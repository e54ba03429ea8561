pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod feed;
pub mod origin;
pub mod state;
pub mod upload;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post, put},
};
use migration::MigratorTrait;
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt};

use config::Config;
use database::connection::{close_connection, establish_connection};
use database::service::*;
use state::AppState;

/// 回答フォームの上限（画像込み）
const ANSWER_BODY_LIMIT: usize = 10 * 1024 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match config
        .cors_allow_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_PASSWORD_HEADER)])
        .max_age(Duration::from_secs(60 * 60))
}

/// 全ルートを組み立てる。管理ルートはパスワード確認を通す
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/questions", get(admin_list_questions))
        .route(
            "/questions/{id}",
            put(admin_update_status).delete(admin_delete_question),
        )
        .route(
            "/questions/{id}/conclusion",
            put(admin_set_conclusion).delete(admin_clear_conclusion),
        )
        .route(
            "/answers",
            post(admin_upsert_answer).layer(DefaultBodyLimit::max(ANSWER_BODY_LIMIT)),
        )
        .route("/log-level", get(admin_get_log_level).put(admin_set_log_level))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/questions", get(list_questions).post(create_question))
        .route("/api/questions/{id}", get(get_question))
        .route("/api/questions/{id}/comments", post(create_comment))
        .route("/api/questions/{id}/like", post(like_question))
        .route("/api/questions/{id}/nannojikandayo", post(nanno_jikan_dayo))
        .route("/api/notifications/status", get(notification_status))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// サーバーを起動し、終了シグナルまで待つ
pub async fn run() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load().context("設定の読み込みに失敗しました")?;

    let conn = establish_connection(&config)
        .await
        .context("データベースに接続できません")?;
    log::info!("データベース接続を確立しました");

    log::info!("データベースのマイグレーションを開始します...");
    migration::Migrator::up(&conn, None)
        .await
        .context("データベースのマイグレーションに失敗しました")?;
    log::info!("マイグレーション完了");

    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(conn.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("{} を待ち受けできません", address))?;
    log::info!("サーバーを起動しました: {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーが異常終了しました")?;

    match close_connection(conn).await {
        Ok(_) => log::info!("データベース接続を閉じました"),
        Err(e) => log::error!("データベース接続を閉じる際にエラーが発生しました: {}", e),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("Ctrl+C を受け取れません: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Ctrl+C を受け取りました。終了します");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                log::info!("終了シグナルを受け取りました。終了します");
            }
            Err(e) => {
                log::error!("シグナルハンドラを登録できません: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
