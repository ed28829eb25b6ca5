//! # Seldon Core
//!
//! 시장 데이터 저장소의 핵심 도메인 모델을 제공합니다:
//! - 거래소, 종목, 일봉 레코드
//! - 결정적 종목 식별자 (`ticker_id`)
//! - 제공자 → 로컬 단방향 차집합
//! - (거래소, 연도) 파티션 및 종가 뷰 이름 규칙
//! - 로깅 인프라

pub mod diff;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use diff::missing_upstream;
pub use domain::*;
pub use error::*;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use types::*;
