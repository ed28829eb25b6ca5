//! 작업 실행기와 cron 등록.

use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use super::{JobKind, JobRegistry, JobState, PipelineGate, Stage};
use crate::config::ScheduleConfig;
use crate::modules::{reconcile_daily_prices, reconcile_exchanges, reconcile_tickers};
use crate::{CollectionStats, CollectorContext, Result};

/// 작업 실행기.
///
/// cron 없이도 `run`으로 직접 실행할 수 있습니다.
#[derive(Clone)]
pub struct JobRunner {
    ctx: CollectorContext,
    registry: JobRegistry,
    gate: PipelineGate,
    single_flight: bool,
    tracker: TaskTracker,
}

impl JobRunner {
    pub fn new(ctx: CollectorContext, single_flight: bool) -> Self {
        Self {
            ctx,
            registry: JobRegistry::new(),
            gate: PipelineGate::new(),
            single_flight,
            tracker: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &PipelineGate {
        &self.gate
    }

    /// 작업을 한 번 실행하고 최종 상태를 반환합니다.
    pub async fn run(&self, kind: JobKind) -> JobState {
        if !self.prerequisites_ready(kind).await {
            warn!(job = %kind, required = ?kind.requires(), "선행 단계 미완료, 실행 건너뜀");
            self.registry.record_skip(kind).await;
            return JobState::Skipped;
        }

        if !self.registry.try_start(kind, self.single_flight).await {
            warn!(job = %kind, "이전 실행이 아직 진행 중, 실행 건너뜀");
            return JobState::Skipped;
        }

        info!(job = %kind, "작업 시작");

        match self.execute(kind).await {
            Ok(stats) => {
                stats.log_summary(kind.name());
                if let Some(stage) = kind.completes() {
                    self.gate.open(stage);
                }
                self.registry.finish(kind, Ok(stats)).await;
                JobState::Succeeded
            }
            Err(e) => {
                error!(job = %kind, error = %e, "작업 실패");
                self.registry.finish(kind, Err(e.to_string())).await;
                JobState::Failed
            }
        }
    }

    /// 선행 단계가 준비되었는지 확인합니다.
    ///
    /// 이번 프로세스에서 완료 토큰이 없으면 저장소를 확인하고, 데이터가 이미 있으면
    /// 토큰을 엽니다. 재시작 직후 제공자 장애가 있어도 기존 데이터로 계속 진행합니다.
    async fn prerequisites_ready(&self, kind: JobKind) -> bool {
        if self.gate.allows(kind) {
            return true;
        }
        let Some(stage) = kind.requires() else {
            return true;
        };

        match self.stage_in_storage(stage).await {
            Ok(true) => {
                info!(job = %kind, stage = ?stage, "저장소에 선행 데이터 존재, 단계 완료 처리");
                self.gate.open(stage);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(job = %kind, stage = ?stage, error = %e, "선행 단계 저장소 확인 실패");
                false
            }
        }
    }

    async fn stage_in_storage(&self, stage: Stage) -> Result<bool> {
        let populated = match stage {
            Stage::Exchanges => !self.ctx.store.list_exchanges().await?.is_empty(),
            Stage::Tickers => !self.ctx.store.list_all_tickers().await?.is_empty(),
        };
        Ok(populated)
    }

    /// 작업을 백그라운드 태스크로 실행합니다 (완료를 기다리지 않음).
    pub fn fire(&self, kind: JobKind) {
        let runner = self.clone();
        self.tracker.spawn(async move {
            runner.run(kind).await;
        });
    }

    /// 거래소 → 종목 순서로 한 번 실행해 파이프라인을 엽니다.
    ///
    /// 두 단계가 모두 성공하면 `true`.
    pub async fn bootstrap(&self) -> bool {
        info!("초기 동기화 시작 (exchanges → tickers)");

        if self.run(JobKind::Exchanges).await != JobState::Succeeded {
            warn!("거래소 동기화 실패, 종목/가격 작업은 다음 성공까지 대기");
            return false;
        }
        if self.run(JobKind::Tickers).await != JobState::Succeeded {
            warn!("종목 동기화 실패, 가격 작업은 다음 성공까지 대기");
            return false;
        }

        info!("초기 동기화 완료");
        true
    }

    /// 초기 동기화를 백그라운드 태스크로 실행합니다.
    ///
    /// `shutdown`이 다른 작업과 함께 완료를 기다립니다.
    pub fn spawn_bootstrap(&self) {
        let runner = self.clone();
        self.tracker.spawn(async move {
            runner.bootstrap().await;
        });
    }

    /// 새 작업을 받지 않고 실행 중인 작업이 끝날 때까지 기다립니다.
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(in_flight = self.tracker.len(), "실행 중인 작업 완료 대기");
        }
        self.tracker.wait().await;
    }

    async fn execute(&self, kind: JobKind) -> Result<CollectionStats> {
        match kind {
            JobKind::Exchanges => reconcile_exchanges(&self.ctx).await,
            JobKind::Tickers => reconcile_tickers(&self.ctx).await,
            JobKind::DailyPrices => reconcile_daily_prices(&self.ctx).await,
            JobKind::Views => {
                let views = self.ctx.partitions().rebuild_all_views().await?;
                views.log_summary();
                Ok(CollectionStats::from(&views))
            }
        }
    }

    /// 모든 작업을 cron 스케줄러에 등록하고 시작합니다.
    ///
    /// 각 트리거는 `fire`만 호출하므로 스케줄러 스레드를 막지 않습니다.
    pub async fn start_scheduler(&self, schedules: &ScheduleConfig) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new().await?;

        for kind in JobKind::ALL {
            let expression = schedules.expression(kind);
            let runner = self.clone();
            let job = Job::new_async(expression, move |_uuid, _lock| {
                let runner = runner.clone();
                Box::pin(async move {
                    runner.fire(kind);
                })
            })?;

            scheduler.add(job).await?;
            info!(job = %kind, cron = expression, "작업 등록");
        }

        scheduler.start().await?;
        Ok(scheduler)
    }

    /// 데몬 모드: 초기 동기화 후 cron 일정으로 실행하고 종료 신호를 기다립니다.
    pub async fn run_daemon(&self, schedules: &ScheduleConfig) -> Result<()> {
        // 종료 신호 대기를 막지 않도록 초기 동기화는 백그라운드에서 실행
        self.spawn_bootstrap();

        let mut scheduler = match self.start_scheduler(schedules).await {
            Ok(scheduler) => scheduler,
            Err(e) => {
                self.shutdown().await;
                return Err(e);
            }
        };
        info!(single_flight = self.single_flight, "스케줄러 시작");

        shutdown_signal().await;

        // 새 트리거 중단 후 실행 중인 작업 완료 대기
        if let Err(e) = scheduler.shutdown().await {
            error!(error = %e, "스케줄러 종료 실패");
        }
        self.shutdown().await;

        for status in self.registry.snapshot().await {
            info!(
                job = %status.kind,
                state = ?status.state,
                runs = status.runs,
                skipped = status.skipped,
                "작업 최종 상태"
            );
        }
        Ok(())
    }
}

/// Ctrl+C 또는 SIGTERM을 기다립니다.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Ctrl+C 수신, 종료 중...");
        }
        _ = terminate => {
            warn!("SIGTERM 수신, 종료 중...");
        }
    }
}
