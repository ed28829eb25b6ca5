//! 수집 작업 공용 컨텍스트.

use seldon_data::{MarketDataProvider, MarketStore};
use std::sync::Arc;

use crate::config::ReconcileConfig;
use crate::modules::PartitionManager;

/// 모든 동기화 작업이 공유하는 의존성 묶음.
///
/// 작업 실행 사이에 엔티티 상태를 캐시하지 않습니다. 매 실행마다 저장소에서 다시 읽습니다.
#[derive(Clone)]
pub struct CollectorContext {
    pub store: Arc<dyn MarketStore>,
    pub provider: Arc<dyn MarketDataProvider>,
    pub config: Arc<ReconcileConfig>,
}

impl CollectorContext {
    pub fn new(
        store: Arc<dyn MarketStore>,
        provider: Arc<dyn MarketDataProvider>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config: Arc::new(config),
        }
    }

    /// 같은 저장소를 쓰는 파티션 관리자
    pub fn partitions(&self) -> PartitionManager {
        PartitionManager::new(Arc::clone(&self.store))
    }
}
