//! 가격 파티션과 거래소별 종가 뷰 관리.
//!
//! 파티션은 (거래소, 연도)마다 하나의 테이블이며 처음 쓰기 직전에 만듭니다.
//! 종가 뷰는 해당 거래소의 모든 파티션을 `UNION ALL`로 묶은 일반 뷰이며,
//! 점진적으로 고치지 않고 매번 다시 만듭니다.

use seldon_core::PriceTable;
use seldon_data::MarketStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::{CollectionStats, Result};

/// 거래소 하나의 뷰 재생성 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// 뷰 생성 (포함된 파티션 수)
    Created { partitions: usize },
    /// 파티션이 없어 뷰를 만들지 않음
    Missed,
}

/// 전체 뷰 재생성 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewRebuildStats {
    /// 확인한 거래소 수
    pub checked: usize,
    /// 생성한 뷰 수
    pub created: usize,
    /// 파티션이 없어 건너뛴 거래소
    pub missed: Vec<String>,
    /// 뷰 생성에 실패한 거래소
    pub failed: Vec<String>,
}

impl ViewRebuildStats {
    pub fn log_summary(&self) {
        info!(
            checked = self.checked,
            created = self.created,
            missed = self.missed.len(),
            failed = self.failed.len(),
            "종가 뷰 재생성 완료"
        );
        if !self.missed.is_empty() {
            info!(exchanges = ?self.missed, "가격 파티션이 없는 거래소");
        }
    }
}

impl From<&ViewRebuildStats> for CollectionStats {
    fn from(views: &ViewRebuildStats) -> Self {
        CollectionStats {
            total: views.checked,
            success: views.created,
            errors: views.failed.len(),
            skipped: views.missed.len(),
            ..Default::default()
        }
    }
}

/// 파티션/뷰 관리자
#[derive(Clone)]
pub struct PartitionManager {
    store: Arc<dyn MarketStore>,
}

impl PartitionManager {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// (거래소, 연도) 파티션을 보장합니다. 여러 번 호출해도 안전합니다.
    pub async fn ensure_price_partition(&self, exchange_code: &str, year: i32) -> Result<PriceTable> {
        let table = PriceTable::new(exchange_code, year)?;
        self.store.ensure_price_partition(&table).await?;
        Ok(table)
    }

    /// 거래소 종가 뷰를 다시 만듭니다.
    ///
    /// 파티션이 하나도 없으면 뷰를 만들지 않고 `Missed`를 반환합니다.
    #[instrument(skip(self))]
    pub async fn rebuild_exchange_view(&self, exchange_code: &str) -> Result<ViewOutcome> {
        let tables = self.store.list_price_tables().await?;
        self.rebuild_from_catalog(exchange_code, &tables).await
    }

    /// 저장소의 모든 거래소에 대해 종가 뷰를 다시 만듭니다.
    ///
    /// 거래소 하나의 실패는 기록만 하고 계속 진행합니다.
    pub async fn rebuild_all_views(&self) -> Result<ViewRebuildStats> {
        let start = Instant::now();
        let exchanges = self.store.list_exchanges().await?;
        let tables = self.store.list_price_tables().await?;
        let mut stats = ViewRebuildStats::default();

        info!(
            exchanges = exchanges.len(),
            partitions = tables.len(),
            "종가 뷰 재생성 시작"
        );

        for exchange in &exchanges {
            stats.checked += 1;
            match self.rebuild_from_catalog(&exchange.code, &tables).await {
                Ok(ViewOutcome::Created { .. }) => stats.created += 1,
                Ok(ViewOutcome::Missed) => stats.missed.push(exchange.code.clone()),
                Err(e) => {
                    error!(exchange = %exchange.code, error = %e, "종가 뷰 생성 실패");
                    stats.failed.push(exchange.code.clone());
                }
            }
        }

        debug!(elapsed_ms = start.elapsed().as_millis(), "종가 뷰 재생성 소요 시간");
        Ok(stats)
    }

    async fn rebuild_from_catalog(
        &self,
        exchange_code: &str,
        catalog: &[PriceTable],
    ) -> Result<ViewOutcome> {
        let mut tables: Vec<PriceTable> = catalog
            .iter()
            .filter(|t| t.belongs_to(exchange_code))
            .cloned()
            .collect();

        if tables.is_empty() {
            debug!(exchange = exchange_code, "가격 파티션 없음, 뷰 생략");
            return Ok(ViewOutcome::Missed);
        }

        tables.sort_by_key(|t| t.year());
        self.store
            .replace_close_price_view(exchange_code, &tables)
            .await?;

        debug!(
            exchange = exchange_code,
            partitions = tables.len(),
            "종가 뷰 생성"
        );
        Ok(ViewOutcome::Created {
            partitions: tables.len(),
        })
    }
}
