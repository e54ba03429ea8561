//! よく使う型のまとめ
//!
//! エンティティを短い名前で読み込むためのモジュール。

pub use super::answers::Entity as Answers;
pub use super::comments::Entity as Comments;
pub use super::likes::Entity as Likes;
pub use super::nanno_jikan_dayo_clicks::Entity as NannoJikanDayoClicks;
pub use super::questions::Entity as Questions;
