//! 저장소 식별자 (스키마, 테이블, 뷰 이름).
//!
//! 식별자는 SQL 파라미터로 바인딩할 수 없으므로 `[a-z0-9_]`로만 구성된 값만
//! 허용하고 항상 큰따옴표로 감싸서 사용합니다.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// 식별자 최대 길이 (PostgreSQL 한도 63자 안에서 접두/접미사 여유).
pub const MAX_IDENT_LEN: usize = 40;

/// 검증된 저장소 식별자.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageIdent(String);

impl StorageIdent {
    /// 이미 정규화된 식별자를 검증합니다 (스키마 이름 등).
    pub fn new(raw: &str) -> CoreResult<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_IDENT_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(CoreError::InvalidIdent(raw.to_string()))
        }
    }

    /// 거래소 코드를 식별자로 정규화합니다.
    ///
    /// 대문자, 숫자, `_`만 허용하고 소문자로 바꿉니다. (예: "NYSE_ARCA" → "nyse_arca")
    /// 다른 문자를 치환하면 "BE.F"와 "BE_F"가 같은 테이블을 가리키게 되므로 거부합니다.
    pub fn from_code(code: &str) -> CoreResult<Self> {
        let valid = !code.trim_matches('_').is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(CoreError::InvalidIdent(code.to_string()));
        }
        Self::new(&code.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SQL에 넣을 수 있도록 큰따옴표로 감싼 형태.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for StorageIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
