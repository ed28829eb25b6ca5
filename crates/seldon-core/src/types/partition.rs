//! (거래소, 연도) 가격 파티션과 거래소별 종가 뷰 이름 규칙.
//!
//! 이름은 (거래소, 연도) 쌍에서 결정적으로 만들어지므로 조회 시 카탈로그가 필요 없습니다.
//!
//! ```text
//! prices_{exchange}_{year}   예: prices_us_2024
//! {exchange}_close_price     예: us_close_price
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::StorageIdent;
use chrono::NaiveDate;
use std::fmt;

/// 가격 테이블 접두사.
pub const PRICE_TABLE_PREFIX: &str = "prices_";

/// 종가 뷰 접미사.
pub const CLOSE_PRICE_VIEW_SUFFIX: &str = "_close_price";

const MIN_YEAR: i32 = 1800;
const MAX_YEAR: i32 = 9999;

/// (거래소, 연도) 가격 파티션 테이블.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceTable {
    exchange: StorageIdent,
    year: i32,
}

impl PriceTable {
    /// 거래소 코드와 연도로 파티션을 지정합니다.
    pub fn new(exchange_code: &str, year: i32) -> CoreResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CoreError::InvalidYear(year));
        }
        Ok(Self {
            exchange: StorageIdent::from_code(exchange_code)?,
            year,
        })
    }

    /// 카탈로그의 테이블 이름을 파싱합니다.
    ///
    /// 거래소 식별자에 `_`가 포함될 수 있으므로 마지막 `_` 뒤를 연도로 봅니다.
    pub fn parse(table_name: &str) -> CoreResult<Self> {
        let not_partition = || CoreError::NotAPartition(table_name.to_string());

        let rest = table_name
            .strip_prefix(PRICE_TABLE_PREFIX)
            .ok_or_else(not_partition)?;
        let (exchange, year) = rest.rsplit_once('_').ok_or_else(not_partition)?;

        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(not_partition());
        }
        let year: i32 = year.parse().map_err(|_| not_partition())?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CoreError::InvalidYear(year));
        }

        let exchange = StorageIdent::new(exchange).map_err(|_| not_partition())?;
        Ok(Self { exchange, year })
    }

    pub fn exchange(&self) -> &StorageIdent {
        &self.exchange
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 테이블 이름 (따옴표 없음).
    pub fn name(&self) -> String {
        format!("{}{}_{}", PRICE_TABLE_PREFIX, self.exchange, self.year)
    }

    /// 이 파티션이 해당 거래소 코드에 속하는지.
    pub fn belongs_to(&self, exchange_code: &str) -> bool {
        StorageIdent::from_code(exchange_code)
            .map(|ident| ident == self.exchange)
            .unwrap_or(false)
    }

    /// 파티션이 담는 날짜 범위 `[start, end)`.
    pub fn date_bounds(&self) -> (NaiveDate, NaiveDate) {
        // 연도 범위를 생성자에서 검증하므로 항상 유효한 날짜
        let start = NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(self.year + 1, 1, 1).unwrap_or(NaiveDate::MAX);
        (start, end)
    }

    /// 날짜가 이 파티션 연도에 속하는지.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.date_bounds();
        date >= start && date < end
    }
}

impl fmt::Display for PriceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// 거래소별 종가 뷰 이름 (따옴표 없음).
pub fn close_price_view_name(exchange_code: &str) -> CoreResult<String> {
    let ident = StorageIdent::from_code(exchange_code)?;
    Ok(format!("{}{}", ident, CLOSE_PRICE_VIEW_SUFFIX))
}
