//! EODHD (eodhd.com) REST API 클라이언트.
//!
//! # 엔드포인트
//!
//! - `exchanges-list/` 거래소 목록
//! - `exchange-symbol-list/{code}` 거래소별 종목 목록
//! - `eod-bulk-last-day/{code}` 최근 거래일 전 종목 일봉
//! - `eod/{ticker}.{code}` 종목별 과거 일봉
//!
//! 모든 요청에 `api_token`과 `fmt=json` 쿼리가 붙습니다. 응답은 JSON 배열이어야
//! 하며, 배열 안의 행은 하나씩 디코딩해 형식이 잘못된 행만 버립니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use seldon_core::{MANUAL_SOURCE, PROVIDER_SOURCE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MarketDataProvider, ProviderBar, ProviderExchange, ProviderTicker};
use crate::error::{ProviderError, ProviderResult};

/// 기본 API 주소.
pub const DEFAULT_BASE_URL: &str = "https://eodhd.com/api";

/// EODHD 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct EodhdConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl EodhdConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// 제공자가 하나의 코드("US")로 묶어 두지만 개별로 추적하는 거래소.
/// `(code, operating_mic, name)`
const SYNTHETIC_EXCHANGES: &[(&str, &str, &str)] = &[
    ("NYSE", "XNYS", "New York Stock Exchange"),
    ("NASDAQ", "XNAS", "NASDAQ"),
];

/// EODHD API 클라이언트.
#[derive(Clone)]
pub struct EodhdClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: Url,
}

impl EodhdClient {
    pub fn new(config: EodhdConfig) -> ProviderResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::Config(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Config(config.base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url,
        })
    }

    /// base URL 뒤에 경로 세그먼트를 붙입니다 (세그먼트는 퍼센트 인코딩됨).
    fn endpoint(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Config(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET 요청을 보내고 JSON 배열의 원소들을 반환합니다.
    async fn fetch_rows(&self, segments: &[&str], query: &[(&str, String)]) -> ProviderResult<Vec<Value>> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();

        debug!(path = %path, "EODHD API 요청");

        let response = self
            .client
            .get(url)
            .query(&[
                ("api_token", self.api_key.expose_secret()),
                ("fmt", "json"),
            ])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: path,
            });
        }

        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            other => Err(ProviderError::InvalidPayload(format!(
                "{} 응답이 배열이 아님: {}",
                path,
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 행 단위로 디코딩하고 실패한 행은 버립니다.
fn decode_rows<R, T>(endpoint: &str, rows: Vec<Value>, convert: impl Fn(R) -> Option<T>) -> Vec<T>
where
    R: DeserializeOwned,
{
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<R>(row).ok())
        .filter_map(convert)
        .collect();

    let dropped = total - decoded.len();
    if dropped > 0 {
        warn!(endpoint, total, dropped, "형식이 잘못된 행 제외");
    }
    decoded
}

/// 빈 문자열은 값 없음으로 봅니다.
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn volume_from(value: Option<f64>) -> Option<i64> {
    value.filter(|v| v.is_finite()).map(|v| v.round() as i64)
}

#[derive(Debug, Deserialize)]
struct ExchangeRow {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "OperatingMIC", default)]
    operating_mic: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
    #[serde(rename = "CountryISO2", default)]
    country_iso2: Option<String>,
    #[serde(rename = "CountryISO3", default)]
    country_iso3: Option<String>,
}

impl ExchangeRow {
    fn into_exchange(self) -> Option<ProviderExchange> {
        let code = non_empty(Some(self.code))?;
        Some(ProviderExchange {
            code,
            name: self.name,
            operating_mic: non_empty(self.operating_mic),
            country: non_empty(self.country),
            currency: non_empty(self.currency),
            country_iso2: non_empty(self.country_iso2),
            country_iso3: non_empty(self.country_iso3),
            source: PROVIDER_SOURCE.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Exchange", default)]
    exchange: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
    #[serde(rename = "Type", default)]
    security_type: Option<String>,
    #[serde(rename = "Isin", default)]
    isin: Option<String>,
}

impl TickerRow {
    fn into_ticker(self) -> Option<ProviderTicker> {
        let code = non_empty(Some(self.code))?;
        Some(ProviderTicker {
            code,
            name: non_empty(self.name),
            country: non_empty(self.country),
            exchange: non_empty(self.exchange),
            currency: non_empty(self.currency),
            security_type: non_empty(self.security_type),
            isin: non_empty(self.isin),
        })
    }
}

/// `eod-bulk-last-day` 행.
#[derive(Debug, Deserialize)]
struct BulkBarRow {
    code: String,
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    adjusted_close: Option<Decimal>,
    #[serde(default)]
    volume: Option<f64>,
}

impl BulkBarRow {
    fn into_bar(self) -> Option<ProviderBar> {
        let ticker = non_empty(Some(self.code))?;
        Some(ProviderBar {
            ticker,
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: volume_from(self.volume),
        })
    }
}

/// `eod/{ticker}.{code}` 행 (티커 코드 없음).
#[derive(Debug, Deserialize)]
struct HistoryBarRow {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    adjusted_close: Option<Decimal>,
    #[serde(default)]
    volume: Option<f64>,
}

fn synthetic_exchange(code: &str, operating_mic: &str, name: &str) -> ProviderExchange {
    ProviderExchange {
        code: code.to_string(),
        name: name.to_string(),
        operating_mic: Some(operating_mic.to_string()),
        country: Some("US".to_string()),
        currency: Some("USD".to_string()),
        country_iso2: Some("US".to_string()),
        country_iso3: Some("USA".to_string()),
        source: MANUAL_SOURCE.to_string(),
    }
}

#[async_trait]
impl MarketDataProvider for EodhdClient {
    fn name(&self) -> &str {
        "EODHD"
    }

    async fn list_exchanges(&self) -> ProviderResult<Vec<ProviderExchange>> {
        let rows = self.fetch_rows(&["exchanges-list", ""], &[]).await?;
        let mut exchanges = decode_rows("exchanges-list", rows, ExchangeRow::into_exchange);

        for (code, mic, name) in SYNTHETIC_EXCHANGES {
            if !exchanges.iter().any(|e| e.code == *code) {
                exchanges.push(synthetic_exchange(code, mic, name));
            }
        }

        Ok(exchanges)
    }

    async fn list_tickers(
        &self,
        provider_exchange_code: &str,
    ) -> ProviderResult<Vec<ProviderTicker>> {
        let rows = self
            .fetch_rows(&["exchange-symbol-list", provider_exchange_code], &[])
            .await?;
        Ok(decode_rows("exchange-symbol-list", rows, TickerRow::into_ticker))
    }

    async fn daily_bars(&self, provider_exchange_code: &str) -> ProviderResult<Vec<ProviderBar>> {
        let rows = self
            .fetch_rows(&["eod-bulk-last-day", provider_exchange_code], &[])
            .await?;
        let mut bars = decode_rows("eod-bulk-last-day", rows, BulkBarRow::into_bar);
        bars.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(bars)
    }

    async fn historical_bars(
        &self,
        provider_exchange_code: &str,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ProviderResult<Vec<ProviderBar>> {
        let symbol = format!("{}.{}", ticker, provider_exchange_code);
        let rows = self
            .fetch_rows(
                &["eod", &symbol],
                &[
                    ("from", from.format("%Y-%m-%d").to_string()),
                    ("to", to.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;

        Ok(decode_rows("eod", rows, |row: HistoryBarRow| {
            Some(ProviderBar {
                ticker: ticker.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                adjusted_close: row.adjusted_close,
                volume: volume_from(row.volume),
            })
        }))
    }
}
