//! 종목 동기화 모듈.

use chrono::Utc;
use seldon_core::{missing_upstream, ticker_id, ticker_source, Exchange, Ticker};
use seldon_data::ProviderTicker;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{CollectionStats, CollectorContext, Result};

/// 거래소 하나의 종목 동기화 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerSyncOutcome {
    /// 누락 종목 삽입 (0건일 수 있음)
    Synced { inserted: u64 },
    /// 제공자 데이터 없음 (조회 실패 포함)
    NoData,
}

/// 저장소에 있는 모든 거래소의 종목을 동기화합니다.
///
/// 거래소 목록은 제공자가 아니라 저장소에서 읽으므로 거래소 동기화가 먼저
/// 실행되어 있어야 합니다. 한 거래소의 실패는 기록만 하고 다음 거래소로 넘어갑니다.
#[instrument(skip_all)]
pub async fn reconcile_tickers(ctx: &CollectorContext) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    ctx.store.ensure_ticker_table().await?;
    let exchanges = ctx.store.list_exchanges().await?;

    info!(exchanges = exchanges.len(), "종목 동기화 시작");

    for exchange in &exchanges {
        if ctx.config.is_excluded(&exchange.code) {
            debug!(exchange = %exchange.code, "제외 대상 거래소");
            stats.skipped += 1;
            continue;
        }
        stats.total += 1;

        match sync_exchange_tickers(ctx, exchange).await {
            Ok(TickerSyncOutcome::Synced { inserted }) => {
                stats.success += 1;
                stats.inserted += inserted;
            }
            Ok(TickerSyncOutcome::NoData) => {
                stats.empty += 1;
            }
            Err(e) => {
                stats.errors += 1;
                error!(exchange = %exchange.code, error = %e, "종목 동기화 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 거래소 하나의 누락 종목을 추가합니다.
///
/// 묶인 거래소(예: NYSE → US)는 제공자 그룹 목록에서 실제 상장 거래소가
/// 로컬 코드와 같은 행만 사용합니다.
pub async fn sync_exchange_tickers(
    ctx: &CollectorContext,
    exchange: &Exchange,
) -> Result<TickerSyncOutcome> {
    let upstream = match ctx.provider.list_tickers(&exchange.provider_code).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                exchange = %exchange.code,
                provider_code = %exchange.provider_code,
                error = %e,
                "종목 조회 실패, 데이터 없음으로 처리"
            );
            return Ok(TickerSyncOutcome::NoData);
        }
    };

    let upstream: Vec<ProviderTicker> = if exchange.is_grouped() {
        upstream
            .into_iter()
            .filter(|t| t.exchange.as_deref() == Some(exchange.code.as_str()))
            .collect()
    } else {
        upstream
    };

    if upstream.is_empty() {
        info!(exchange = %exchange.code, "제공자 종목 없음");
        return Ok(TickerSyncOutcome::NoData);
    }

    let now = Utc::now();
    let source = ticker_source(&exchange.provider_code);
    let candidates: Vec<Ticker> = upstream
        .into_iter()
        .map(|t| Ticker {
            ticker_id: ticker_id(&t.code, &exchange.code),
            ticker: t.code,
            name: t.name,
            country: t.country,
            exchange_code: exchange.code.clone(),
            provider_exchange_code: exchange.provider_code.clone(),
            currency: t.currency,
            security_type: t.security_type,
            isin: t.isin,
            source: source.clone(),
            updated_at: now,
        })
        .collect();
    let fetched = candidates.len();

    let local = ctx.store.list_tickers(&exchange.code).await?;
    let missing = missing_upstream(candidates, local.into_iter().map(|t| t.ticker_id), |t| {
        t.ticker_id.clone()
    });

    let inserted = ctx.store.insert_tickers(&missing).await?;

    info!(
        exchange = %exchange.code,
        fetched,
        missing = missing.len(),
        inserted,
        "종목 동기화 완료"
    );
    Ok(TickerSyncOutcome::Synced { inserted })
}
