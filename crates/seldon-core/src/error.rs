//! 도메인 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// 저장소 식별자로 쓸 수 없는 코드
    #[error("잘못된 식별자: {0:?}")]
    InvalidIdent(String),

    /// 파티션 테이블 이름 형식이 아님
    #[error("파티션 테이블 이름이 아님: {0}")]
    NotAPartition(String),

    /// 파티션 연도 범위 초과
    #[error("잘못된 파티션 연도: {0}")]
    InvalidYear(i32),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
