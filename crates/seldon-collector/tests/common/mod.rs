//! 통합 테스트용 메모리 저장소와 스크립트 제공자.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use seldon_collector::{CollectorContext, ReconcileConfig};
use seldon_core::{
    close_price_view_name, Exchange, PriceBar, PriceTable, Ticker, PROVIDER_SOURCE,
};
use seldon_data::{
    DataError, MarketDataProvider, MarketStore, ProviderBar, ProviderError, ProviderExchange,
    ProviderResult, ProviderTicker, Result,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ==================== 메모리 저장소 ====================

#[derive(Default)]
struct StoreState {
    exchange_table: bool,
    ticker_table: bool,
    exchanges: Vec<Exchange>,
    tickers: Vec<Ticker>,
    partitions: BTreeMap<PriceTable, BTreeMap<(String, NaiveDate), PriceBar>>,
    views: HashMap<String, Vec<PriceTable>>,
    failing_ticker_exchanges: HashSet<String>,
    partition_creates: usize,
}

/// 트랜잭션 단위가 호출 하나인 메모리 `MarketStore`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed_exchange(&self, code: &str, provider_code: &str) {
        let mut state = self.state.lock().await;
        state.exchange_table = true;
        state.exchanges.push(exchange(code, provider_code));
    }

    pub async fn seed_ticker(&self, ticker: &str, exchange_code: &str, provider_code: &str) {
        let mut state = self.state.lock().await;
        state.ticker_table = true;
        state.tickers.push(Ticker {
            ticker_id: seldon_core::ticker_id(ticker, exchange_code),
            ticker: ticker.to_string(),
            name: None,
            country: None,
            exchange_code: exchange_code.to_string(),
            provider_exchange_code: provider_code.to_string(),
            currency: None,
            security_type: None,
            isin: None,
            source: PROVIDER_SOURCE.to_string(),
            updated_at: Utc::now(),
        });
    }

    /// 파티션을 만들고 가격을 바로 넣습니다.
    pub async fn seed_prices(&self, exchange_code: &str, rows: &[(&str, &str, Decimal)]) {
        let mut state = self.state.lock().await;
        for (ticker, day, close) in rows {
            let bar = price_bar(ticker, exchange_code, date(day), *close);
            let table = PriceTable::new(exchange_code, bar.year()).unwrap();
            state
                .partitions
                .entry(table)
                .or_default()
                .insert((bar.ticker_id.clone(), bar.date), bar);
        }
    }

    /// 해당 거래소의 종목 삽입을 실패시킵니다.
    pub async fn fail_ticker_inserts_for(&self, exchange_code: &str) {
        let mut state = self.state.lock().await;
        state
            .failing_ticker_exchanges
            .insert(exchange_code.to_string());
    }

    pub async fn exchange_codes(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut codes: Vec<String> = state.exchanges.iter().map(|e| e.code.clone()).collect();
        codes.sort();
        codes
    }

    pub async fn exchanges(&self) -> Vec<Exchange> {
        self.state.lock().await.exchanges.clone()
    }

    pub async fn tickers(&self) -> Vec<Ticker> {
        self.state.lock().await.tickers.clone()
    }

    pub async fn ticker_ids(&self, exchange_code: &str) -> Vec<String> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state
            .tickers
            .iter()
            .filter(|t| t.exchange_code == exchange_code)
            .map(|t| t.ticker_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn partition_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.partitions.keys().map(|t| t.name()).collect()
    }

    pub async fn partition_creates(&self) -> usize {
        self.state.lock().await.partition_creates
    }

    pub async fn prices(&self, table_name: &str) -> Vec<PriceBar> {
        let state = self.state.lock().await;
        state
            .partitions
            .iter()
            .find(|(table, _)| table.name() == table_name)
            .map(|(_, rows)| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// 종가 뷰 조회: 뷰에 포함된 파티션의 (ticker_id, date, close) 합집합.
    pub async fn query_close_view(&self, exchange_code: &str) -> Option<Vec<(String, NaiveDate, Decimal)>> {
        let state = self.state.lock().await;
        let view = close_price_view_name(exchange_code).ok()?;
        let tables = state.views.get(&view)?;

        let mut rows = Vec::new();
        for table in tables {
            if let Some(partition) = state.partitions.get(table) {
                rows.extend(
                    partition
                        .values()
                        .map(|bar| (bar.ticker_id.clone(), bar.date, bar.close)),
                );
            }
        }
        Some(rows)
    }

    pub async fn view_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.views.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn ensure_exchange_table(&self) -> Result<()> {
        self.state.lock().await.exchange_table = true;
        Ok(())
    }

    async fn ensure_ticker_table(&self) -> Result<()> {
        self.state.lock().await.ticker_table = true;
        Ok(())
    }

    async fn list_exchanges(&self) -> Result<Vec<Exchange>> {
        let state = self.state.lock().await;
        if !state.exchange_table {
            return Err(DataError::QueryError("relation \"exchanges\" does not exist".into()));
        }
        Ok(state.exchanges.clone())
    }

    async fn insert_exchanges(&self, exchanges: &[Exchange]) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut inserted = 0;
        for exchange in exchanges {
            if !state.exchanges.iter().any(|e| e.code == exchange.code) {
                state.exchanges.push(exchange.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_tickers(&self, exchange_code: &str) -> Result<Vec<Ticker>> {
        let state = self.state.lock().await;
        Ok(state
            .tickers
            .iter()
            .filter(|t| t.exchange_code == exchange_code)
            .cloned()
            .collect())
    }

    async fn list_all_tickers(&self) -> Result<Vec<Ticker>> {
        Ok(self.state.lock().await.tickers.clone())
    }

    async fn insert_tickers(&self, tickers: &[Ticker]) -> Result<u64> {
        let mut state = self.state.lock().await;
        if let Some(t) = tickers
            .iter()
            .find(|t| state.failing_ticker_exchanges.contains(&t.exchange_code))
        {
            return Err(DataError::QueryError(format!(
                "insert into tickers failed for {}",
                t.exchange_code
            )));
        }

        let mut inserted = 0;
        for ticker in tickers {
            if !state.tickers.iter().any(|t| t.ticker_id == ticker.ticker_id) {
                state.tickers.push(ticker.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn ensure_price_partition(&self, table: &PriceTable) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.partitions.contains_key(table) {
            state.partitions.insert(table.clone(), BTreeMap::new());
            state.partition_creates += 1;
        }
        Ok(())
    }

    async fn price_table_exists(&self, table: &PriceTable) -> Result<bool> {
        Ok(self.state.lock().await.partitions.contains_key(table))
    }

    async fn latest_price_date(
        &self,
        table: &PriceTable,
        exchange_code: &str,
    ) -> Result<Option<NaiveDate>> {
        let state = self.state.lock().await;
        Ok(state.partitions.get(table).and_then(|rows| {
            rows.values()
                .filter(|bar| bar.exchange_code == exchange_code)
                .map(|bar| bar.date)
                .max()
        }))
    }

    async fn insert_prices(&self, table: &PriceTable, bars: &[PriceBar]) -> Result<u64> {
        let mut state = self.state.lock().await;
        if bars.iter().any(|bar| !table.contains(bar.date)) {
            return Err(DataError::InvalidData(format!("date outside {}", table)));
        }
        let partition = state
            .partitions
            .get_mut(table)
            .ok_or_else(|| DataError::QueryError(format!("relation \"{}\" does not exist", table)))?;

        let mut inserted = 0;
        for bar in bars {
            let key = (bar.ticker_id.clone(), bar.date);
            if !partition.contains_key(&key) {
                partition.insert(key, bar.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_price_tables(&self) -> Result<Vec<PriceTable>> {
        Ok(self.state.lock().await.partitions.keys().cloned().collect())
    }

    async fn replace_close_price_view(
        &self,
        exchange_code: &str,
        tables: &[PriceTable],
    ) -> Result<()> {
        let view = close_price_view_name(exchange_code)?;
        let mut state = self.state.lock().await;
        state.views.insert(view, tables.to_vec());
        Ok(())
    }
}

pub fn exchange(code: &str, provider_code: &str) -> Exchange {
    Exchange {
        code: code.to_string(),
        provider_code: provider_code.to_string(),
        name: format!("{} Exchange", code),
        operating_mic: None,
        country: None,
        currency: None,
        country_iso2: None,
        country_iso3: None,
        source: PROVIDER_SOURCE.to_string(),
        updated_at: Utc::now(),
    }
}

pub fn price_bar(ticker: &str, exchange_code: &str, day: NaiveDate, close: Decimal) -> PriceBar {
    PriceBar {
        ticker_id: seldon_core::ticker_id(ticker, exchange_code),
        ticker: ticker.to_string(),
        exchange_code: exchange_code.to_string(),
        provider_exchange_code: exchange_code.to_string(),
        date: day,
        open: close,
        high: close,
        low: close,
        close,
        adjusted_close: Some(close),
        volume: Some(1_000),
    }
}

// ==================== 스크립트 제공자 ====================

#[derive(Default)]
struct Script {
    exchanges: Option<Vec<ProviderExchange>>,
    tickers: HashMap<String, Vec<ProviderTicker>>,
    daily: HashMap<String, Vec<ProviderBar>>,
    history: HashMap<String, Vec<ProviderBar>>,
}

/// 미리 정해 둔 응답을 돌려주는 `MarketDataProvider`.
///
/// 등록되지 않은 요청은 네트워크 오류로 응답합니다.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: AtomicUsize,
    /// 설정되면 `daily_bars`가 허가를 얻을 때까지 대기
    daily_gate: Option<Arc<Semaphore>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `daily_bars` 호출이 세마포어 허가를 기다리는 제공자
    pub fn blocking_daily(gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            daily_gate: Some(gate),
            ..Default::default()
        })
    }

    pub async fn set_exchanges(&self, codes: &[&str]) {
        let rows = codes
            .iter()
            .map(|code| ProviderExchange {
                code: code.to_string(),
                name: format!("{} Exchange", code),
                operating_mic: None,
                country: None,
                currency: None,
                country_iso2: None,
                country_iso3: None,
                source: PROVIDER_SOURCE.to_string(),
            })
            .collect();
        self.script.lock().await.exchanges = Some(rows);
    }

    /// `(code, upstream exchange)` 목록
    pub async fn set_tickers(&self, provider_code: &str, rows: &[(&str, &str)]) {
        let rows = rows
            .iter()
            .map(|(code, exchange)| ProviderTicker {
                code: code.to_string(),
                name: Some(format!("{} Inc", code)),
                country: Some("USA".to_string()),
                exchange: Some(exchange.to_string()),
                currency: Some("USD".to_string()),
                security_type: Some("Common Stock".to_string()),
                isin: None,
            })
            .collect();
        self.script
            .lock()
            .await
            .tickers
            .insert(provider_code.to_string(), rows);
    }

    /// `(ticker, date, close)` 목록
    pub async fn set_daily(&self, provider_code: &str, rows: &[(&str, &str, Decimal)]) {
        let mut bars: Vec<ProviderBar> = rows.iter().map(|r| provider_bar(r.0, r.1, r.2)).collect();
        bars.sort_by(|a, b| b.date.cmp(&a.date));
        self.script
            .lock()
            .await
            .daily
            .insert(provider_code.to_string(), bars);
    }

    /// `(date, close)` 목록
    pub async fn set_history(&self, ticker: &str, rows: &[(&str, Decimal)]) {
        let bars = rows
            .iter()
            .map(|(day, close)| provider_bar(ticker, day, *close))
            .collect();
        self.script
            .lock()
            .await
            .history
            .insert(ticker.to_string(), bars);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn provider_bar(ticker: &str, day: &str, close: Decimal) -> ProviderBar {
    ProviderBar {
        ticker: ticker.to_string(),
        date: date(day),
        open: close,
        high: close,
        low: close,
        close,
        adjusted_close: Some(close),
        volume: Some(1_000),
    }
}

fn unavailable(what: &str) -> ProviderError {
    ProviderError::Network(format!("{} unavailable", what))
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_exchanges(&self) -> ProviderResult<Vec<ProviderExchange>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .exchanges
            .clone()
            .ok_or_else(|| unavailable("exchanges-list"))
    }

    async fn list_tickers(&self, provider_exchange_code: &str) -> ProviderResult<Vec<ProviderTicker>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .tickers
            .get(provider_exchange_code)
            .cloned()
            .ok_or_else(|| unavailable(provider_exchange_code))
    }

    async fn daily_bars(&self, provider_exchange_code: &str) -> ProviderResult<Vec<ProviderBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.daily_gate {
            let _permit = gate.acquire().await.map_err(|_| unavailable("gate"))?;
        }
        self.script
            .lock()
            .await
            .daily
            .get(provider_exchange_code)
            .cloned()
            .ok_or_else(|| unavailable(provider_exchange_code))
    }

    async fn historical_bars(
        &self,
        _provider_exchange_code: &str,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ProviderResult<Vec<ProviderBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().await;
        let bars = script.history.get(ticker).ok_or_else(|| unavailable(ticker))?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= from && b.date <= to)
            .cloned()
            .collect())
    }
}

// ==================== 컨텍스트 ====================

pub fn test_config() -> ReconcileConfig {
    ReconcileConfig {
        history_request_delay_ms: 0,
        ..Default::default()
    }
}

pub fn context(store: &Arc<MemoryStore>, provider: &Arc<ScriptedProvider>) -> CollectorContext {
    CollectorContext::new(
        Arc::clone(store) as Arc<dyn MarketStore>,
        Arc::clone(provider) as Arc<dyn MarketDataProvider>,
        test_config(),
    )
}
