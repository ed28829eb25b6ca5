//! Seldon 시장 데이터 수집기.
//!
//! 이 crate는 제공자와 로컬 저장소를 동기화하는 작업을 제공합니다:
//! - 거래소/종목 동기화 (제공자에만 있는 레코드 추가)
//! - 일별 가격 증분 업데이트와 과거 가격 적재
//! - (거래소, 연도) 파티션과 거래소별 종가 뷰 관리
//! - cron 스케줄러와 파이프라인 게이트

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod scheduler;
pub mod stats;

pub use config::{CollectorConfig, ReconcileConfig, ScheduleConfig};
pub use context::CollectorContext;
pub use error::{CollectorError, Result};
pub use scheduler::{JobKind, JobRegistry, JobRunner, JobState, PipelineGate, Stage};
pub use stats::CollectionStats;
