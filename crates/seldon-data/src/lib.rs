//! 저장소 게이트웨이와 시장 데이터 제공자.
//!
//! 이 crate는 다음을 제공합니다:
//! - `MarketStore`: 거래소/종목/가격 파티션 저장소 (PostgreSQL 구현)
//! - `MarketDataProvider`: 시장 데이터 제공자 (EODHD 구현)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, ProviderError, ProviderResult, Result};

pub use provider::{
    EodhdClient, EodhdConfig, MarketDataProvider, ProviderBar, ProviderExchange, ProviderTicker,
};
pub use storage::{DatabaseConfig, MarketStore, PgMarketStore};
