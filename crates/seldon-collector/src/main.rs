//! Seldon 시장 데이터 수집기 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use seldon_collector::modules::{self, HistoryScope};
use seldon_collector::{CollectorConfig, CollectorContext, JobKind, JobRunner};
use seldon_core::{init_logging, LogConfig};
use seldon_data::{EodhdClient, MarketStore, PgMarketStore};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "seldon-collector")]
#[command(about = "Seldon market-data reconciliation collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 거래소 동기화
    SyncExchanges,

    /// 종목 동기화 (저장된 모든 거래소)
    SyncTickers,

    /// 일별 가격 증분 업데이트
    UpdateDailyPrices,

    /// 과거 가격 적재
    PopulateHistory {
        /// 특정 거래소만 적재 (예: "US")
        #[arg(long)]
        exchange: Option<String>,

        /// 특정 티커만 적재 (쉼표로 구분, 예: "AAPL,MSFT")
        #[arg(long)]
        tickers: Option<String>,
    },

    /// 종가 뷰 재생성
    RefreshViews {
        /// 특정 거래소만 재생성
        #[arg(long)]
        exchange: Option<String>,
    },

    /// 전체 워크플로우 실행 (거래소 → 종목 → 일별 가격 → 뷰)
    RunAll,

    /// 데몬 모드: cron 일정으로 작업 실행
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    let log_config =
        LogConfig::new(format!("seldon_collector={0},seldon_data={0}", cli.log_level))
            .with_env_overrides();
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Seldon Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(schema = %config.database.schema, "설정 로드 완료");

    // 저장소/제공자 연결
    let store = Arc::new(PgMarketStore::connect(&config.database).await?);
    store
        .health_check()
        .await
        .context("데이터베이스 상태 확인 실패")?;
    let provider = Arc::new(EodhdClient::new(config.provider.clone())?);

    let ctx = CollectorContext::new(
        Arc::clone(&store) as Arc<dyn MarketStore>,
        provider,
        config.reconcile.clone(),
    );

    // 명령 실행
    match cli.command {
        Commands::SyncExchanges => {
            let stats = modules::reconcile_exchanges(&ctx).await?;
            stats.log_summary("거래소 동기화");
        }
        Commands::SyncTickers => {
            let stats = modules::reconcile_tickers(&ctx).await?;
            stats.log_summary("종목 동기화");
        }
        Commands::UpdateDailyPrices => {
            let stats = modules::reconcile_daily_prices(&ctx).await?;
            stats.log_summary("일별 가격 업데이트");
        }
        Commands::PopulateHistory { exchange, tickers } => {
            let scope = HistoryScope {
                exchange,
                tickers: tickers.as_deref().map(HistoryScope::parse_tickers),
            };
            let stats = modules::populate_price_history(&ctx, &scope).await?;
            stats.log_summary("과거 가격 적재");
        }
        Commands::RefreshViews { exchange } => match exchange {
            Some(code) => {
                let outcome = ctx.partitions().rebuild_exchange_view(&code).await?;
                tracing::info!(exchange = %code, outcome = ?outcome, "종가 뷰 재생성 완료");
            }
            None => {
                let views = ctx.partitions().rebuild_all_views().await?;
                views.log_summary();
            }
        },
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");

            let runner = JobRunner::new(ctx.clone(), true);
            for (step, kind) in [
                JobKind::Exchanges,
                JobKind::Tickers,
                JobKind::DailyPrices,
                JobKind::Views,
            ]
            .into_iter()
            .enumerate()
            {
                tracing::info!("Step {}/4: {}", step + 1, kind);
                let state = runner.run(kind).await;
                tracing::info!(job = %kind, state = ?state, "단계 완료");
            }

            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
        Commands::Daemon => {
            tracing::info!("=== 데몬 모드 시작 ===");

            let runner = JobRunner::new(ctx.clone(), config.schedule.single_flight);
            runner.run_daemon(&config.schedule).await?;
        }
    }

    store.close().await;
    tracing::info!("Seldon Collector 종료");

    Ok(())
}
