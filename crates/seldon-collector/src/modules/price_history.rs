//! 과거 가격 일괄 적재 모듈.
//!
//! 종목별 전체 시계열을 받아 연도별 파티션에 그대로 추가합니다. 증분 검사는 하지 않으며
//! 이미 있는 (ticker_id, date) 행은 저장소에서 무시됩니다.

use chrono::Utc;
use seldon_core::{split_by_year, PriceBar, Ticker};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{CollectionStats, CollectorContext, Result};

/// 적재 대상 범위
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryScope {
    /// 특정 거래소만 적재
    pub exchange: Option<String>,
    /// 특정 티커 코드만 적재
    pub tickers: Option<Vec<String>>,
}

impl HistoryScope {
    /// 쉼표로 구분된 티커 목록 파싱 (예: "AAPL,MSFT")
    pub fn parse_tickers(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn includes(&self, ticker: &Ticker) -> bool {
        self.tickers
            .as_ref()
            .map_or(true, |codes| codes.iter().any(|code| *code == ticker.ticker))
    }
}

/// 종목 하나의 적재 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Loaded { years: usize, inserted: u64 },
    NoData,
}

/// 저장소 종목의 과거 가격을 적재합니다.
///
/// 종목 하나의 실패는 기록만 하고 다음 종목으로 넘어갑니다.
#[instrument(skip_all, fields(exchange = ?scope.exchange))]
pub async fn populate_price_history(
    ctx: &CollectorContext,
    scope: &HistoryScope,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let tickers = match &scope.exchange {
        Some(code) => ctx.store.list_tickers(code).await?,
        None => ctx.store.list_all_tickers().await?,
    };
    let targets: Vec<Ticker> = tickers
        .into_iter()
        .filter(|t| !ctx.config.is_excluded(&t.exchange_code))
        .filter(|t| scope.includes(t))
        .collect();

    if targets.is_empty() {
        warn!("적재할 종목이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    info!(tickers = targets.len(), "과거 가격 적재 시작");

    for (idx, ticker) in targets.iter().enumerate() {
        if idx > 0 {
            // Rate limiting
            tokio::time::sleep(ctx.config.history_request_delay()).await;
        }
        stats.total += 1;

        debug!(
            ticker_id = %ticker.ticker_id,
            progress = format!("{}/{}", idx + 1, targets.len()),
            "적재 시작"
        );

        match load_ticker_history(ctx, ticker).await {
            Ok(HistoryOutcome::Loaded { inserted, .. }) => {
                stats.success += 1;
                stats.inserted += inserted;
            }
            Ok(HistoryOutcome::NoData) => {
                stats.empty += 1;
            }
            Err(e) => {
                stats.errors += 1;
                error!(ticker_id = %ticker.ticker_id, error = %e, "과거 가격 적재 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 종목 하나의 전체 시계열을 연도별 파티션에 적재합니다 (최신 연도부터).
pub async fn load_ticker_history(ctx: &CollectorContext, ticker: &Ticker) -> Result<HistoryOutcome> {
    let today = Utc::now().date_naive();
    let bars = match ctx
        .provider
        .historical_bars(
            &ticker.provider_exchange_code,
            &ticker.ticker,
            ctx.config.history_start,
            today,
        )
        .await
    {
        Ok(bars) => bars,
        Err(e) => {
            warn!(ticker_id = %ticker.ticker_id, error = %e, "과거 가격 조회 실패, 데이터 없음으로 처리");
            return Ok(HistoryOutcome::NoData);
        }
    };

    if bars.is_empty() {
        info!(ticker_id = %ticker.ticker_id, "과거 가격 없음");
        return Ok(HistoryOutcome::NoData);
    }

    let rows: Vec<PriceBar> = bars
        .into_iter()
        .map(|bar| PriceBar {
            ticker_id: ticker.ticker_id.clone(),
            ticker: ticker.ticker.clone(),
            exchange_code: ticker.exchange_code.clone(),
            provider_exchange_code: ticker.provider_exchange_code.clone(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adjusted_close: bar.adjusted_close,
            volume: bar.volume,
        })
        .collect();

    let partitions = ctx.partitions();
    let by_year = split_by_year(rows);
    let years = by_year.len();
    let mut inserted = 0;

    for (year, year_rows) in by_year.into_iter().rev() {
        let table = partitions
            .ensure_price_partition(&ticker.exchange_code, year)
            .await?;
        inserted += ctx.store.insert_prices(&table, &year_rows).await?;
    }

    info!(ticker_id = %ticker.ticker_id, years, inserted, "과거 가격 적재 완료");
    Ok(HistoryOutcome::Loaded { years, inserted })
}
