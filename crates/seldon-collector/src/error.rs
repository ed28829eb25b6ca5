//! 에러 타입 정의.

use seldon_core::CoreError;
use seldon_data::{DataError, ProviderError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 저장소 에러
    #[error("Storage error: {0}")]
    Storage(#[from] DataError),

    /// 데이터 제공자 에러
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 잘못된 식별자/파티션
    #[error("Identifier error: {0}")]
    Identifier(#[from] CoreError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 스케줄러 에러
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<tokio_cron_scheduler::JobSchedulerError> for CollectorError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        Self::Scheduler(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
