use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl From<log::LevelFilter> for LogLevel {
    fn from(level: log::LevelFilter) -> Self {
        match level {
            log::LevelFilter::Error => LogLevel::Error,
            log::LevelFilter::Warn => LogLevel::Warn,
            log::LevelFilter::Info => LogLevel::Info,
            log::LevelFilter::Debug => LogLevel::Debug,
            log::LevelFilter::Trace => LogLevel::Trace,
            log::LevelFilter::Off => LogLevel::Off,
        }
    }
}

/// 実行中にログの出力レベルを変える（再起動で元に戻る）
///
/// 起動時の RUST_LOG より細かいレベルにはならない。
pub fn set_log_level(level: &str) -> Result<LogLevel, String> {
    let lf = match level.trim().to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        other => return Err(format!("無効なログレベルです: {}", other)),
    };
    log::set_max_level(lf);
    log::info!("ログレベルを {} に変更しました", lf);
    Ok(lf.into())
}

/// 現在のログレベル
pub fn current_log_level() -> LogLevel {
    log::max_level().into()
}
