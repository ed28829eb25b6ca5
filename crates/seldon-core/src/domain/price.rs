//! 일봉 가격 데이터.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 일봉 레코드.
///
/// (exchange_code, date의 연도) 파티션 테이블에 저장됩니다.
/// `(ticker_id, date)`당 최대 한 행만 존재합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct PriceBar {
    pub ticker_id: String,
    pub ticker: String,
    pub exchange_code: String,
    pub provider_exchange_code: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Option<Decimal>,
    pub volume: Option<i64>,
}

impl PriceBar {
    /// 파티션 연도.
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// 가격 데이터를 연도별로 분할합니다.
///
/// 반환된 맵은 연도 오름차순이므로, 최신 연도부터 처리하려면 `.into_iter().rev()`를 사용합니다.
pub fn split_by_year(bars: Vec<PriceBar>) -> BTreeMap<i32, Vec<PriceBar>> {
    let mut by_year: BTreeMap<i32, Vec<PriceBar>> = BTreeMap::new();
    for bar in bars {
        by_year.entry(bar.year()).or_default().push(bar);
    }
    by_year
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(date: &str) -> PriceBar {
        PriceBar {
            ticker_id: "AAPL_US".to_string(),
            ticker: "AAPL".to_string(),
            exchange_code: "US".to_string(),
            provider_exchange_code: "US".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: dec!(1),
            high: dec!(2),
            low: dec!(0.5),
            close: dec!(1.5),
            adjusted_close: Some(dec!(1.5)),
            volume: Some(100),
        }
    }

    #[test]
    fn test_split_by_year_newest_first() {
        let bars = vec![
            bar("2022-12-30"),
            bar("2024-01-02"),
            bar("2023-06-01"),
            bar("2024-01-03"),
        ];

        let years: Vec<(i32, usize)> = split_by_year(bars)
            .into_iter()
            .rev()
            .map(|(year, rows)| (year, rows.len()))
            .collect();

        assert_eq!(years, vec![(2024, 2), (2023, 1), (2022, 1)]);
    }
}
