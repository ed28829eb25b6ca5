//! 데이터 모듈 오류 타입.

use seldon_core::CoreError;
use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 잘못된 식별자/파티션
    #[error("Invalid identifier: {0}")]
    InvalidIdent(#[from] CoreError),

    /// 잘못된 데이터 (파티션 연도 밖의 날짜 등)
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    DataError::DuplicateError(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 시장 데이터 제공자 오류.
///
/// 수집 작업은 이 오류를 대부분 "데이터 없음"으로 취급합니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 비정상 HTTP 상태 코드
    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },

    /// 응답 형식이 예상과 다름 (JSON 배열이 아님 등)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// 클라이언트 설정 오류 (잘못된 base URL 등)
    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidPayload(err.to_string())
        } else {
            // URL에 api_token이 포함되므로 제거
            ProviderError::Network(err.without_url().to_string())
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
