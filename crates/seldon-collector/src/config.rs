//! 환경변수 기반 설정 모듈.
//!
//! `CollectorConfig`는 `main`에서 한 번 만들어 각 구성 요소에 전달합니다.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use seldon_core::StorageIdent;
use seldon_data::{DatabaseConfig, EodhdConfig};
use std::time::Duration;

use crate::error::CollectorError;
use crate::scheduler::JobKind;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// EODHD 클라이언트 설정
    pub provider: EodhdConfig,
    /// 동기화 설정
    pub reconcile: ReconcileConfig,
    /// 스케줄 설정
    pub schedule: ScheduleConfig,
}

/// 동기화 작업 설정
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// 동기화에서 제외할 거래소 코드
    pub excluded_exchanges: Vec<String>,
    /// 제공자가 하나의 코드로 묶어 두는 거래소
    pub grouped_exchanges: Vec<String>,
    /// 묶인 거래소의 제공자 코드
    pub grouped_provider_code: String,
    /// 과거 데이터 요청 간 딜레이 (밀리초)
    pub history_request_delay_ms: u64,
    /// 과거 데이터 요청 시작일
    pub history_start: NaiveDate,
}

/// 작업별 cron 표현식 (초 필드 포함 6필드)
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub daily_prices: String,
    pub exchanges: String,
    pub tickers: String,
    pub views: String,
    /// 같은 작업이 실행 중이면 새 실행을 건너뜀
    pub single_flight: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            excluded_exchanges: vec!["MONEY".to_string(), "BRVM".to_string()],
            grouped_exchanges: ["NASDAQ", "NYSE", "PINK", "NMFQS", "NYSE_ARCA", "NYSE_MKT"]
                .iter()
                .map(|code| code.to_string())
                .collect(),
            grouped_provider_code: "US".to_string(),
            history_request_delay_ms: 200,
            history_start: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl ReconcileConfig {
    /// 제외 목록에 있는 거래소인지
    pub fn is_excluded(&self, exchange_code: &str) -> bool {
        self.excluded_exchanges.iter().any(|code| code == exchange_code)
    }

    /// 로컬 거래소 코드에 대응하는 제공자 코드
    pub fn provider_code_for(&self, exchange_code: &str) -> String {
        if self.grouped_exchanges.iter().any(|code| code == exchange_code) {
            self.grouped_provider_code.clone()
        } else {
            exchange_code.to_string()
        }
    }

    /// 과거 데이터 요청 간 딜레이를 Duration으로 반환
    pub fn history_request_delay(&self) -> Duration {
        Duration::from_millis(self.history_request_delay_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_prices: "0 0 */4 * * *".to_string(),
            exchanges: "0 0 2 1 * *".to_string(),
            tickers: "0 0 3 * * SUN".to_string(),
            views: "0 30 4 * * *".to_string(),
            single_flight: true,
        }
    }
}

impl ScheduleConfig {
    /// 작업의 cron 표현식
    pub fn expression(&self, kind: JobKind) -> &str {
        match kind {
            JobKind::DailyPrices => &self.daily_prices,
            JobKind::Exchanges => &self.exchanges,
            JobKind::Tickers => &self.tickers,
            JobKind::Views => &self.views,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 포함)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 주어진 조회 함수로 설정을 구성합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let schema = vars.string("DB_SCHEMA", "public");
        let schema = StorageIdent::new(&schema)
            .map_err(|e| CollectorError::Config(format!("DB_SCHEMA: {}", e)))?;

        let database = DatabaseConfig {
            url: database_url(&vars)?,
            schema,
            max_connections: vars.parse("DB_MAX_CONNECTIONS", 10),
            min_connections: vars.parse("DB_MIN_CONNECTIONS", 1),
            connect_timeout_secs: vars.parse("DB_CONNECT_TIMEOUT_SECS", 30),
            idle_timeout_secs: vars.parse("DB_IDLE_TIMEOUT_SECS", 600),
        };

        let api_key = vars.get("EODHD_API_KEY").ok_or_else(|| {
            CollectorError::Config("EODHD_API_KEY 환경변수가 설정되지 않았습니다".to_string())
        })?;
        let mut provider = EodhdConfig::new(SecretString::from(api_key));
        if let Some(base_url) = vars.get("EODHD_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }
        provider.timeout_secs = vars.parse("EODHD_TIMEOUT_SECS", provider.timeout_secs);

        let defaults = ReconcileConfig::default();
        let reconcile = ReconcileConfig {
            excluded_exchanges: vars
                .get("EXCLUDED_EXCHANGES")
                .map(|v| split_codes(&v))
                .unwrap_or(defaults.excluded_exchanges),
            history_request_delay_ms: vars.parse(
                "PROVIDER_REQUEST_DELAY_MS",
                defaults.history_request_delay_ms,
            ),
            ..defaults
        };

        let defaults = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            daily_prices: vars.string("SCHEDULE_DAILY_PRICES", &defaults.daily_prices),
            exchanges: vars.string("SCHEDULE_EXCHANGES", &defaults.exchanges),
            tickers: vars.string("SCHEDULE_TICKERS", &defaults.tickers),
            views: vars.string("SCHEDULE_VIEWS", &defaults.views),
            single_flight: vars.bool("SCHEDULER_SINGLE_FLIGHT", defaults.single_flight),
        };

        Ok(Self {
            database,
            provider,
            reconcile,
            schedule,
        })
    }
}

/// `DATABASE_URL` 또는 `DB_*` 개별 변수로 접속 URL을 만듭니다.
fn database_url(vars: &Vars<'_>) -> Result<SecretString> {
    if let Some(url) = vars.get("DATABASE_URL") {
        return Ok(SecretString::from(url));
    }

    let missing = |key: &str| {
        CollectorError::Config(format!(
            "DATABASE_URL 또는 {} 환경변수가 설정되지 않았습니다",
            key
        ))
    };
    let user = vars.get("DB_USER").ok_or_else(|| missing("DB_USER"))?;
    let name = vars.get("DB_NAME").ok_or_else(|| missing("DB_NAME"))?;
    let host = vars.string("DB_HOST", "localhost");
    let port: u16 = vars.parse("DB_PORT", 5432);
    let password = vars.get("DB_PASSWORD").map(SecretString::from);

    let credentials = match &password {
        Some(password) => format!("{}:{}", user, password.expose_secret()),
        None => user,
    };

    Ok(SecretString::from(format!(
        "postgresql://{}@{}:{}/{}",
        credentials, host, port, name
    )))
}

fn split_codes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect()
}

/// 빈 값은 설정되지 않은 것으로 보는 환경변수 조회기
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// 환경변수에서 bool 값 파싱 (대소문자 무시, 알 수 없는 값은 기본값)
    fn bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("true" | "1" | "yes" | "on") => true,
            Some("false" | "0" | "no" | "off") => false,
            _ => default,
        }
    }
}
