//! 저장소 게이트웨이.
//!
//! 수집 작업은 `MarketStore` trait에만 의존하며, 운영 구현은 PostgreSQL
//! (`PgMarketStore`)입니다. 각 쓰기 작업은 자체 트랜잭션에서 실행되고
//! 실패 시 롤백 후 오류를 그대로 반환합니다. 여러 작업을 묶는 트랜잭션은 없습니다
//! (예: 파티션 생성 → 삽입은 두 개의 트랜잭션).

pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use seldon_core::{Exchange, PriceBar, PriceTable, Ticker};

use crate::error::Result;

pub use postgres::{DatabaseConfig, PgMarketStore};

/// 거래소/종목/가격 파티션 저장소.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// 거래소 테이블 생성 (없을 때만).
    async fn ensure_exchange_table(&self) -> Result<()>;

    /// 종목 테이블 생성 (없을 때만).
    async fn ensure_ticker_table(&self) -> Result<()>;

    /// 저장된 모든 거래소.
    async fn list_exchanges(&self) -> Result<Vec<Exchange>>;

    /// 거래소 일괄 삽입. 실제 삽입된 행 수를 반환합니다.
    async fn insert_exchanges(&self, exchanges: &[Exchange]) -> Result<u64>;

    /// 거래소의 저장된 종목.
    async fn list_tickers(&self, exchange_code: &str) -> Result<Vec<Ticker>>;

    /// 저장된 모든 종목.
    async fn list_all_tickers(&self) -> Result<Vec<Ticker>>;

    /// 종목 일괄 삽입. 실제 삽입된 행 수를 반환합니다.
    async fn insert_tickers(&self, tickers: &[Ticker]) -> Result<u64>;

    /// 가격 파티션 생성 (없을 때만, 멱등).
    async fn ensure_price_partition(&self, table: &PriceTable) -> Result<()>;

    /// 가격 파티션 존재 여부.
    async fn price_table_exists(&self, table: &PriceTable) -> Result<bool>;

    /// 파티션에서 거래소의 최신 가격 날짜. 테이블이 없거나 비어 있으면 `None`.
    async fn latest_price_date(
        &self,
        table: &PriceTable,
        exchange_code: &str,
    ) -> Result<Option<NaiveDate>>;

    /// 파티션에 가격 일괄 삽입. 모든 날짜는 파티션 연도에 속해야 합니다.
    async fn insert_prices(&self, table: &PriceTable, bars: &[PriceBar]) -> Result<u64>;

    /// 카탈로그에 있는 모든 가격 파티션.
    async fn list_price_tables(&self) -> Result<Vec<PriceTable>>;

    /// 거래소 종가 뷰를 다시 만듭니다 (drop 후 create).
    async fn replace_close_price_view(
        &self,
        exchange_code: &str,
        tables: &[PriceTable],
    ) -> Result<()>;
}

/// 파티션 연도 밖의 날짜가 섞여 있는지 검사합니다.
pub(crate) fn check_partition_dates(table: &PriceTable, bars: &[PriceBar]) -> Result<()> {
    if let Some(bar) = bars.iter().find(|bar| !table.contains(bar.date)) {
        return Err(crate::error::DataError::InvalidData(format!(
            "{} 날짜 {}는 파티션 {}에 속하지 않음",
            bar.ticker_id, bar.date, table
        )));
    }
    Ok(())
}
