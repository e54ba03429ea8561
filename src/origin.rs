//! 匿名の訪問者を区別するための発信元識別子
//!
//! プロキシが付けるヘッダーから推定するだけなので、偽装も共有（NAT など）もありうる。
//! 認証には使わない。

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use std::convert::Infallible;

/// 優先順に調べるヘッダー
pub const ORIGIN_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// どのヘッダーも無いときの値
pub const UNKNOWN_ORIGIN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(Option<String>);

impl ClientOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let found = ORIGIN_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                // x-forwarded-for は "client, proxy1, proxy2" 形式なので先頭だけ使う
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        });
        Self(found)
    }

    /// 重複判定に使うキー。不明な訪問者は全員ひとつの値にまとまる
    pub fn dedup_key(&self) -> String {
        self.0.clone().unwrap_or_else(|| UNKNOWN_ORIGIN.to_string())
    }

    /// コメントに記録する値。不明なら NULL
    pub fn recorded_address(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn forwarded_for_wins_and_takes_first_hop() {
        let origin = ClientOrigin::from_headers(&headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]));
        assert_eq!(origin.dedup_key(), "203.0.113.9");
    }

    #[test]
    fn falls_back_through_real_ip_then_cdn_header() {
        let origin = ClientOrigin::from_headers(&headers(&[("x-real-ip", "198.51.100.2")]));
        assert_eq!(origin.dedup_key(), "198.51.100.2");

        let origin = ClientOrigin::from_headers(&headers(&[("cf-connecting-ip", "192.0.2.44")]));
        assert_eq!(origin.dedup_key(), "192.0.2.44");
    }

    #[test]
    fn blank_headers_are_skipped() {
        let origin = ClientOrigin::from_headers(&headers(&[
            ("x-forwarded-for", " "),
            ("x-real-ip", "198.51.100.2"),
        ]));
        assert_eq!(origin.dedup_key(), "198.51.100.2");
    }

    #[test]
    fn missing_headers_use_sentinel_for_dedup_and_null_for_comments() {
        let origin = ClientOrigin::from_headers(&HeaderMap::new());
        assert_eq!(origin.dedup_key(), UNKNOWN_ORIGIN);
        assert_eq!(origin.recorded_address(), None);
    }
}
