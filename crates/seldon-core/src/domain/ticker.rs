//! 종목(티커) 도메인 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 종목 식별자 생성.
///
/// `<ticker>_<exchange>` 형식의 결정적 복합 키입니다. 같은 (ticker, exchange) 쌍은
/// 항상 같은 ID가 되어야 하며, 동기화 diff가 이 성질에 의존합니다.
///
/// ```
/// use seldon_core::ticker_id;
///
/// assert_eq!(ticker_id("AAPL", "US"), "AAPL_US");
/// ```
pub fn ticker_id(ticker: &str, exchange_code: &str) -> String {
    format!("{}_{}", ticker, exchange_code)
}

/// 종목 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Ticker {
    /// 고유 키 (`ticker_id(ticker, exchange_code)`)
    pub ticker_id: String,
    /// 티커 코드 (예: AAPL)
    pub ticker: String,
    /// 종목명
    pub name: Option<String>,
    /// 국가
    pub country: Option<String>,
    /// 로컬 거래소 코드
    pub exchange_code: String,
    /// 제공자 거래소 코드
    pub provider_exchange_code: String,
    /// 거래 통화
    pub currency: Option<String>,
    /// 종목 유형 (Common Stock, ETF, ...)
    #[cfg_attr(feature = "sqlx-support", sqlx(rename = "type"))]
    pub security_type: Option<String>,
    /// ISIN
    pub isin: Option<String>,
    /// 데이터 출처
    pub source: String,
    /// 마지막 갱신 시각
    pub updated_at: DateTime<Utc>,
}

/// 제공자별 종목 출처 표기.
pub fn ticker_source(provider_exchange_code: &str) -> String {
    format!("{} - Exchange {}", super::PROVIDER_SOURCE, provider_exchange_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_id_is_deterministic() {
        assert_eq!(ticker_id("AAPL", "US"), "AAPL_US");
        assert_eq!(ticker_id("AAPL", "US"), ticker_id("AAPL", "US"));
        assert_ne!(ticker_id("AAPL", "US"), ticker_id("AAPL", "NASDAQ"));
    }

    #[test]
    fn test_ticker_id_keeps_dotted_codes() {
        assert_eq!(ticker_id("BRK.B", "NYSE"), "BRK.B_NYSE");
    }

    #[test]
    fn test_ticker_source() {
        assert_eq!(ticker_source("US"), "EoDHD.com - Exchange US");
    }
}
