//! 質問フィードの問い合わせ仕様
//!
//! クエリ文字列から「どの質問を・どの順で・何ページ目を」返すかを型として組み立てる。
//! ここでは DB に触れない。SQL への変換は `QuestionsRepository` が一度だけ行う。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::questions::Category;

/// 一ページあたりの件数（クライアントからは変更できない）
pub const PAGE_SIZE: u64 = 10;

/// カテゴリ絞り込み
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    /// 絞り込みなし（未指定・空文字・"all"）
    Any,
    /// 完全一致
    Only(Category),
    /// 定義外の値。エラーにはせず一件も返さない
    NoMatch,
}

impl CategoryFilter {
    pub fn from_param(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::Any;
        };
        if value.eq_ignore_ascii_case("all") {
            return Self::Any;
        }
        Category::parse(value).map_or(Self::NoMatch, Self::Only)
    }
}

/// 並び順
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedSort {
    /// 新しい順
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    /// いいねの多い順
    #[serde(rename = "likes")]
    Likes,
    /// 「なんの時間だよ」の多い順
    #[serde(rename = "nannotokis")]
    NannoTokis,
}

impl FeedSort {
    /// 未知の値は既定（新しい順）に倒す
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("likes") => Self::Likes,
            Some("nannotokis") => Self::NannoTokis,
            _ => Self::CreatedAt,
        }
    }
}

/// 検索語を空白（全角スペースを含む）で分割する
///
/// 空文字や空白のみの場合は空の Vec を返し、「検索なし」として扱う。
pub fn tokenize_search(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// ページ番号の正規化。1 未満や解釈できない値は 1 にする。上限は設けない
pub fn normalize_page(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .map_or(1, |p| p as u64)
}

/// 一覧取得の条件一式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub category: CategoryFilter,
    pub keywords: Vec<String>,
    pub sort: FeedSort,
    pub page: u64,
    pub limit: u64,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::Any,
            keywords: Vec::new(),
            sort: FeedSort::CreatedAt,
            page: 1,
            limit: PAGE_SIZE,
        }
    }
}

impl FeedQuery {
    pub fn from_params(
        category: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
        page: Option<&str>,
    ) -> Self {
        Self {
            category: CategoryFilter::from_param(category),
            keywords: tokenize_search(search),
            sort: FeedSort::from_param(sort),
            page: normalize_page(page),
            limit: PAGE_SIZE,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

/// 前後の質問を探すときの基準点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingAnchor {
    pub id: i32,
    pub created_at: DateTime<Utc>,
}

impl SiblingAnchor {
    pub fn parse(id: &str, created_at: &str) -> Result<Self, String> {
        let id = id
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("currentQuestionId が不正です: {}", id))?;
        let created_at = DateTime::parse_from_rfc3339(created_at.trim())
            .map_err(|e| format!("currentQuestionCreatedAt が不正です: {}", e))?
            .with_timezone(&Utc);
        Ok(Self { id, created_at })
    }
}

/// GET /api/questions の二つのモード。基準点があれば一覧は実行しない
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    Siblings(SiblingAnchor),
    Listing(FeedQuery),
}
