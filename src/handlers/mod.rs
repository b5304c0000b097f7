// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (session JWT) → Elevated (session JWT + Admin role)

pub mod elevated;
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Path ids are plain digits; signs, whitespace and overflow are rejected
pub(crate) fn parse_numeric_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub(crate) fn path_id(raw: &str) -> Result<i64, ApiError> {
    parse_numeric_id(raw).ok_or_else(|| ApiError::bad_request("Invalid ID format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_must_be_plain_digits() {
        assert_eq!(parse_numeric_id("42"), Some(42));
        assert_eq!(parse_numeric_id("-1"), None);
        assert_eq!(parse_numeric_id("4a"), None);
        assert_eq!(parse_numeric_id(""), None);
        assert_eq!(parse_numeric_id("99999999999999999999"), None);
    }

    #[test]
    fn invalid_path_ids_are_bad_requests() {
        assert_eq!(path_id("x").unwrap_err().status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
