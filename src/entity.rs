//! データ実体モジュール
//!
//! すべての SeaORM エンティティ定義をまとめる。

pub mod prelude;

// === 親テーブル ===
pub mod questions;

// === 子テーブル（質問の削除に連動して消える）===
pub mod answers;
pub mod comments;
pub mod likes;
pub mod nanno_jikan_dayo_clicks;
