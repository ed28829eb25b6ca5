//! 거래소 도메인 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 제공자(EODHD) 원본 데이터 출처 표기.
pub const PROVIDER_SOURCE: &str = "EoDHD.com";

/// 수동 입력(합성) 레코드 출처 표기.
pub const MANUAL_SOURCE: &str = "Manual_Input";

/// 거래소 레코드.
///
/// `code`가 유일한 식별자입니다. 로컬에 없을 때 처음 생성되며 이 엔진은 삭제하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Exchange {
    /// 로컬 거래소 코드 (예: US, LSE, NYSE)
    pub code: String,
    /// 제공자 측 거래소 코드 (NYSE, NASDAQ 등은 "US"로 묶임)
    pub provider_code: String,
    /// 거래소명
    pub name: String,
    /// ISO 10383 MIC
    pub operating_mic: Option<String>,
    /// 국가명
    pub country: Option<String>,
    /// 거래 통화
    pub currency: Option<String>,
    /// ISO 3166 alpha-2
    pub country_iso2: Option<String>,
    /// ISO 3166 alpha-3
    pub country_iso3: Option<String>,
    /// 데이터 출처
    pub source: String,
    /// 마지막 갱신 시각
    pub updated_at: DateTime<Utc>,
}

impl Exchange {
    /// 제공자 그룹에 묶인 거래소인지 (로컬 코드와 제공자 코드가 다름).
    pub fn is_grouped(&self) -> bool {
        self.code != self.provider_code
    }
}
