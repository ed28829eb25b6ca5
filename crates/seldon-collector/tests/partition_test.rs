//! 파티션/종가 뷰 관리 통합 테스트.

mod common;

use common::{context, date, MemoryStore, ScriptedProvider};
use rust_decimal_macros::dec;
use seldon_collector::modules::ViewOutcome;
use std::collections::HashSet;

#[tokio::test]
async fn ensure_partition_twice_creates_once() {
    let store = MemoryStore::new();
    let provider = ScriptedProvider::new();
    let partitions = context(&store, &provider).partitions();

    let first = partitions.ensure_price_partition("US", 2024).await.unwrap();
    let second = partitions.ensure_price_partition("US", 2024).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name(), "prices_us_2024");
    assert_eq!(store.partition_creates().await, 1);
    assert_eq!(store.partition_names().await, vec!["prices_us_2024"]);
}

#[tokio::test]
async fn ensure_partition_rejects_invalid_code() {
    let store = MemoryStore::new();
    let provider = ScriptedProvider::new();
    let partitions = context(&store, &provider).partitions();

    assert!(partitions.ensure_price_partition("", 2024).await.is_err());
    assert!(partitions.ensure_price_partition("US", 10_000).await.is_err());
    assert!(store.partition_names().await.is_empty());
}

#[tokio::test]
async fn exchange_view_unions_every_year() {
    let store = MemoryStore::new();
    let provider = ScriptedProvider::new();
    store.seed_exchange("US", "US").await;
    store
        .seed_prices(
            "US",
            &[
                ("AAPL", "2022-12-30", dec!(129.9)),
                ("AAPL", "2023-12-29", dec!(192.5)),
                ("IBM", "2023-12-29", dec!(163.5)),
                ("AAPL", "2024-01-02", dec!(185.6)),
            ],
        )
        .await;
    let partitions = context(&store, &provider).partitions();

    let outcome = partitions.rebuild_exchange_view("US").await.unwrap();
    assert_eq!(outcome, ViewOutcome::Created { partitions: 3 });

    let rows = store.query_close_view("US").await.unwrap();
    assert_eq!(rows.len(), 4);

    let keys: HashSet<(String, chrono::NaiveDate)> =
        rows.iter().map(|(id, day, _)| (id.clone(), *day)).collect();
    assert_eq!(keys.len(), rows.len());
    assert!(rows.contains(&("AAPL_US".to_string(), date("2022-12-30"), dec!(129.9))));
    assert!(rows.contains(&("IBM_US".to_string(), date("2023-12-29"), dec!(163.5))));
}

#[tokio::test]
async fn exchange_view_ignores_other_exchanges_with_shared_prefix() {
    let store = MemoryStore::new();
    let provider = ScriptedProvider::new();
    store
        .seed_prices("NYSE", &[("IBM", "2024-01-02", dec!(161.5))])
        .await;
    store
        .seed_prices("NYSE_ARCA", &[("SPY", "2024-01-02", dec!(472.6))])
        .await;
    let partitions = context(&store, &provider).partitions();

    partitions.rebuild_exchange_view("NYSE").await.unwrap();

    let rows = store.query_close_view("NYSE").await.unwrap();
    assert_eq!(rows, vec![("IBM_NYSE".to_string(), date("2024-01-02"), dec!(161.5))]);
}

#[tokio::test]
async fn rebuild_all_views_reports_missed_exchanges() {
    let store = MemoryStore::new();
    let provider = ScriptedProvider::new();
    store.seed_exchange("US", "US").await;
    store.seed_exchange("LSE", "LSE").await;
    store.seed_exchange("XETRA", "XETRA").await;
    store
        .seed_prices("US", &[("AAPL", "2024-01-02", dec!(185.6))])
        .await;
    store
        .seed_prices("LSE", &[("VOD", "2024-01-02", dec!(0.69))])
        .await;
    let partitions = context(&store, &provider).partitions();

    let stats = partitions.rebuild_all_views().await.unwrap();

    assert_eq!(stats.checked, 3);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.missed, vec!["XETRA".to_string()]);
    assert!(stats.failed.is_empty());
    assert_eq!(
        store.view_names().await,
        vec!["lse_close_price", "us_close_price"]
    );

    // 다시 실행해도 같은 결과
    let again = partitions.rebuild_all_views().await.unwrap();
    assert_eq!(again, stats);
}
