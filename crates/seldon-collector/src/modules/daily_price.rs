//! 일별 가격 증분 업데이트 모듈.
//!
//! 거래소마다 최근 거래일 일봉을 한 번에 받아, 저장된 최신 날짜보다 새로운 행만 추가합니다.
//! 파티션이 비어 있는 거래소는 과거 데이터 적재(`populate-history`)가 먼저 필요합니다.

use chrono::{Datelike, NaiveDate};
use seldon_core::{split_by_year, Exchange, PriceBar, PriceTable, Ticker};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{CollectionStats, CollectorContext, Result};

/// 거래소 하나의 일별 업데이트 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyPriceOutcome {
    /// 새 가격 추가
    Inserted { inserted: u64, unknown_tickers: usize },
    /// 저장된 데이터가 이미 최신
    UpToDate,
    /// 저장된 가격이 없음, 과거 데이터 적재 필요
    NeedsBackfill,
    /// 제공자 데이터 없음 (조회 실패 포함)
    NoData,
}

/// 저장소의 모든 거래소에 대해 일별 가격을 업데이트합니다.
///
/// 한 거래소의 실패는 기록만 하고 다음 거래소로 넘어갑니다.
#[instrument(skip_all)]
pub async fn reconcile_daily_prices(ctx: &CollectorContext) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let exchanges = ctx.store.list_exchanges().await?;
    info!(exchanges = exchanges.len(), "일별 가격 업데이트 시작");

    for exchange in &exchanges {
        if ctx.config.is_excluded(&exchange.code) {
            stats.skipped += 1;
            continue;
        }
        stats.total += 1;

        match update_exchange_prices(ctx, exchange).await {
            Ok(DailyPriceOutcome::Inserted { inserted, .. }) => {
                stats.success += 1;
                stats.inserted += inserted;
            }
            Ok(DailyPriceOutcome::UpToDate) | Ok(DailyPriceOutcome::NeedsBackfill) => {
                stats.skipped += 1;
            }
            Ok(DailyPriceOutcome::NoData) => {
                stats.empty += 1;
            }
            Err(e) => {
                stats.errors += 1;
                error!(exchange = %exchange.code, error = %e, "일별 가격 업데이트 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 거래소 하나의 일별 가격을 업데이트합니다.
pub async fn update_exchange_prices(
    ctx: &CollectorContext,
    exchange: &Exchange,
) -> Result<DailyPriceOutcome> {
    let bars = match ctx.provider.daily_bars(&exchange.provider_code).await {
        Ok(bars) => bars,
        Err(e) => {
            warn!(
                exchange = %exchange.code,
                provider_code = %exchange.provider_code,
                error = %e,
                "일봉 조회 실패, 데이터 없음으로 처리"
            );
            return Ok(DailyPriceOutcome::NoData);
        }
    };

    let Some(new_price_date) = bars.iter().map(|b| b.date).max() else {
        info!(exchange = %exchange.code, "제공자 일봉 없음");
        return Ok(DailyPriceOutcome::NoData);
    };

    let partitions = ctx.partitions();
    let table = partitions
        .ensure_price_partition(&exchange.code, new_price_date.year())
        .await?;

    let Some(latest_price_date) = stored_latest_date(ctx, &table, &exchange.code).await? else {
        info!(
            exchange = %exchange.code,
            table = %table,
            "저장된 가격 없음, 과거 데이터 적재 필요"
        );
        return Ok(DailyPriceOutcome::NeedsBackfill);
    };

    if new_price_date <= latest_price_date {
        debug!(
            exchange = %exchange.code,
            %new_price_date,
            %latest_price_date,
            "이미 최신"
        );
        return Ok(DailyPriceOutcome::UpToDate);
    }

    let tickers = ctx.store.list_tickers(&exchange.code).await?;
    let by_code: HashMap<&str, &Ticker> = tickers.iter().map(|t| (t.ticker.as_str(), t)).collect();

    let mut unknown_tickers = 0;
    let mut rows: Vec<PriceBar> = Vec::new();
    for bar in bars.into_iter().filter(|b| b.date > latest_price_date) {
        let Some(ticker) = by_code.get(bar.ticker.as_str()) else {
            unknown_tickers += 1;
            continue;
        };
        rows.push(PriceBar {
            ticker_id: ticker.ticker_id.clone(),
            ticker: bar.ticker,
            exchange_code: exchange.code.clone(),
            provider_exchange_code: exchange.provider_code.clone(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adjusted_close: bar.adjusted_close,
            volume: bar.volume,
        });
    }

    let mut inserted = 0;
    for (year, year_rows) in split_by_year(rows).into_iter().rev() {
        let table = partitions.ensure_price_partition(&exchange.code, year).await?;
        inserted += ctx.store.insert_prices(&table, &year_rows).await?;
    }

    info!(
        exchange = %exchange.code,
        %new_price_date,
        %latest_price_date,
        inserted,
        unknown_tickers,
        "일별 가격 추가 완료"
    );
    Ok(DailyPriceOutcome::Inserted {
        inserted,
        unknown_tickers,
    })
}

/// 파티션의 최신 가격 날짜. 연초라 해당 연도 파티션이 비어 있으면 전년도 파티션을 봅니다.
async fn stored_latest_date(
    ctx: &CollectorContext,
    table: &PriceTable,
    exchange_code: &str,
) -> Result<Option<NaiveDate>> {
    if let Some(date) = ctx.store.latest_price_date(table, exchange_code).await? {
        return Ok(Some(date));
    }

    let previous = PriceTable::new(exchange_code, table.year() - 1)?;
    Ok(ctx.store.latest_price_date(&previous, exchange_code).await?)
}
