//! 데이터 동기화 모듈.

pub mod daily_price;
pub mod exchange_sync;
pub mod partition;
pub mod price_history;
pub mod ticker_sync;

pub use daily_price::{reconcile_daily_prices, update_exchange_prices, DailyPriceOutcome};
pub use exchange_sync::reconcile_exchanges;
pub use partition::{PartitionManager, ViewOutcome, ViewRebuildStats};
pub use price_history::{load_ticker_history, populate_price_history, HistoryOutcome, HistoryScope};
pub use ticker_sync::{reconcile_tickers, sync_exchange_tickers, TickerSyncOutcome};
