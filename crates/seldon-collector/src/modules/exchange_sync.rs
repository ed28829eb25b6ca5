//! 거래소 동기화 모듈.
//!
//! 다른 모든 작업의 기반 데이터이므로 어느 단계든 실패하면 전체 실행을 중단합니다.

use chrono::Utc;
use seldon_core::{missing_upstream, Exchange};
use seldon_data::ProviderExchange;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::{CollectionStats, CollectorContext, Result};

/// 제공자에만 있는 거래소를 저장소에 추가합니다.
///
/// 로컬에만 있는 거래소는 그대로 두고, 양쪽에 모두 있는 거래소는 필드가 달라도 갱신하지 않습니다.
#[instrument(skip_all)]
pub async fn reconcile_exchanges(ctx: &CollectorContext) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    info!(provider = ctx.provider.name(), "거래소 동기화 시작");

    ctx.store.ensure_exchange_table().await?;

    let upstream = ctx.provider.list_exchanges().await?;
    let fetched = upstream.len();
    let upstream: Vec<ProviderExchange> = upstream
        .into_iter()
        .filter(|e| !ctx.config.is_excluded(&e.code))
        .collect();
    stats.total = upstream.len();

    if upstream.is_empty() {
        warn!("제공자가 거래소를 반환하지 않음");
        stats.empty = 1;
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let local = ctx.store.list_exchanges().await?;
    let missing = missing_upstream(upstream, local.into_iter().map(|e| e.code), |e| {
        e.code.clone()
    });

    info!(
        fetched,
        excluded = fetched - stats.total,
        missing = missing.len(),
        "거래소 차집합 계산 완료"
    );

    let now = Utc::now();
    let rows: Vec<Exchange> = missing
        .into_iter()
        .map(|e| Exchange {
            provider_code: ctx.config.provider_code_for(&e.code),
            code: e.code,
            name: e.name,
            operating_mic: e.operating_mic,
            country: e.country,
            currency: e.currency,
            country_iso2: e.country_iso2,
            country_iso3: e.country_iso3,
            source: e.source,
            updated_at: now,
        })
        .collect();

    stats.inserted = ctx.store.insert_exchanges(&rows).await?;
    stats.success = rows.len();
    stats.skipped = stats.total - rows.len();
    stats.elapsed = start.elapsed();

    info!(inserted = stats.inserted, "거래소 동기화 완료");
    Ok(stats)
}
