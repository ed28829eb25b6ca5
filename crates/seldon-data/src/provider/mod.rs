//! 시장 데이터 제공자.
//!
//! 수집 작업은 `MarketDataProvider` trait에만 의존합니다. 운영 구현은 EODHD
//! (`EodhdClient`)이며, 테스트에서는 스크립트된 구현으로 대체합니다.

pub mod eodhd;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

pub use eodhd::{EodhdClient, EodhdConfig};

/// 제공자가 반환한 거래소 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderExchange {
    pub code: String,
    pub name: String,
    pub operating_mic: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub country_iso2: Option<String>,
    pub country_iso3: Option<String>,
    /// 출처 표기 (합성 행은 `Manual_Input`)
    pub source: String,
}

/// 제공자가 반환한 종목 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTicker {
    /// 티커 코드
    pub code: String,
    pub name: Option<String>,
    pub country: Option<String>,
    /// 실제 상장 거래소 (그룹 코드 "US" 아래의 NYSE, NASDAQ 등)
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub security_type: Option<String>,
    pub isin: Option<String>,
}

/// 제공자가 반환한 일봉 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBar {
    /// 티커 코드
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Option<Decimal>,
    pub volume: Option<i64>,
}

/// 시장 데이터 제공자.
///
/// 모든 메서드는 네트워크/디코딩 실패를 `Err`로 반환합니다. 호출자는 이를
/// 항목 단위의 "데이터 없음"으로 다룹니다.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 제공자 이름 (로그용).
    fn name(&self) -> &str;

    /// 전체 거래소 목록 (그룹 거래소의 합성 행 포함).
    async fn list_exchanges(&self) -> ProviderResult<Vec<ProviderExchange>>;

    /// 제공자 거래소 코드의 종목 목록.
    async fn list_tickers(&self, provider_exchange_code: &str)
        -> ProviderResult<Vec<ProviderTicker>>;

    /// 최근 거래일의 전 종목 일봉 (최신 날짜 우선 정렬).
    async fn daily_bars(&self, provider_exchange_code: &str) -> ProviderResult<Vec<ProviderBar>>;

    /// 한 종목의 `[from, to]` 기간 일봉.
    async fn historical_bars(
        &self,
        provider_exchange_code: &str,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ProviderResult<Vec<ProviderBar>>;
}
