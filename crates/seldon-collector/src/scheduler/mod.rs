//! 작업 스케줄러.
//!
//! 네 개의 반복 작업(일별 가격, 거래소, 종목, 뷰)을 cron 일정으로 실행합니다.
//! 작업 간 선후 관계는 `PipelineGate`로 명시합니다:
//!
//! ```text
//! exchanges ──▶ tickers ──▶ daily_prices
//! views (독립)
//! ```

mod runner;

pub use runner::{shutdown_signal, JobRunner};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::CollectionStats;

/// 반복 작업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    DailyPrices,
    Exchanges,
    Tickers,
    Views,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::DailyPrices,
        JobKind::Exchanges,
        JobKind::Tickers,
        JobKind::Views,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::DailyPrices => "daily_prices",
            JobKind::Exchanges => "exchanges",
            JobKind::Tickers => "tickers",
            JobKind::Views => "views",
        }
    }

    /// 실행 전에 완료되어 있어야 하는 단계
    pub fn requires(&self) -> Option<Stage> {
        match self {
            JobKind::Tickers => Some(Stage::Exchanges),
            JobKind::DailyPrices => Some(Stage::Tickers),
            JobKind::Exchanges | JobKind::Views => None,
        }
    }

    /// 성공 시 완료 처리되는 단계
    pub fn completes(&self) -> Option<Stage> {
        match self {
            JobKind::Exchanges => Some(Stage::Exchanges),
            JobKind::Tickers => Some(Stage::Tickers),
            JobKind::DailyPrices | JobKind::Views => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 파이프라인 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Exchanges,
    Tickers,
}

/// 작업 상태.
///
/// `Idle → Running → Succeeded | Failed`이며, `Running`이 아닌 상태는 모두 다음 실행을
/// 받을 수 있습니다. 선행 단계가 준비되지 않아 건너뛴 실행은 `Skipped`로 기록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// 작업별 실행 기록
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub kind: JobKind,
    pub state: JobState,
    /// 완료된 실행 수 (성공 + 실패)
    pub runs: u64,
    /// 건너뛴 실행 수
    pub skipped: u64,
    /// 동시에 실행 중인 인스턴스 수
    pub active: usize,
    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_stats: Option<CollectionStats>,
}

impl JobStatus {
    fn new(kind: JobKind) -> Self {
        Self {
            kind,
            state: JobState::Idle,
            runs: 0,
            skipped: 0,
            active: 0,
            last_started: None,
            last_finished: None,
            last_error: None,
            last_stats: None,
        }
    }
}

/// 작업 상태 레지스트리
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<Mutex<HashMap<JobKind, JobStatus>>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        let statuses = JobKind::ALL
            .iter()
            .map(|kind| (*kind, JobStatus::new(*kind)))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(statuses)),
        }
    }

    /// 실행 시작을 기록합니다.
    ///
    /// `single_flight`이고 이미 실행 중이면 `false`를 반환하며 아무것도 바꾸지 않습니다.
    pub async fn try_start(&self, kind: JobKind, single_flight: bool) -> bool {
        let mut statuses = self.inner.lock().await;
        let status = statuses.entry(kind).or_insert_with(|| JobStatus::new(kind));

        if single_flight && status.active > 0 {
            status.skipped += 1;
            return false;
        }

        status.active += 1;
        status.state = JobState::Running;
        status.last_started = Some(Utc::now());
        true
    }

    /// 실행 종료를 기록합니다.
    pub async fn finish(&self, kind: JobKind, outcome: Result<CollectionStats, String>) {
        let mut statuses = self.inner.lock().await;
        let status = statuses.entry(kind).or_insert_with(|| JobStatus::new(kind));

        status.active = status.active.saturating_sub(1);
        status.runs += 1;
        status.last_finished = Some(Utc::now());

        let state = match outcome {
            Ok(stats) => {
                status.last_error = None;
                status.last_stats = Some(stats);
                JobState::Succeeded
            }
            Err(e) => {
                status.last_error = Some(e);
                JobState::Failed
            }
        };
        if status.active == 0 {
            status.state = state;
        }
    }

    /// 선행 단계 미완료로 건너뛴 실행을 기록합니다.
    pub async fn record_skip(&self, kind: JobKind) {
        let mut statuses = self.inner.lock().await;
        let status = statuses.entry(kind).or_insert_with(|| JobStatus::new(kind));

        status.skipped += 1;
        if status.active == 0 {
            status.state = JobState::Skipped;
        }
    }

    pub async fn status(&self, kind: JobKind) -> JobStatus {
        let statuses = self.inner.lock().await;
        statuses
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| JobStatus::new(kind))
    }

    /// 전체 작업 상태 (JobKind 순서)
    pub async fn snapshot(&self) -> Vec<JobStatus> {
        let statuses = self.inner.lock().await;
        let mut snapshot: Vec<JobStatus> = statuses.values().cloned().collect();
        snapshot.sort_by_key(|s| s.kind);
        snapshot
    }
}

/// 파이프라인 단계 완료 토큰.
///
/// 프로세스 안에서만 유지되는 빠른 경로입니다. 토큰이 닫혀 있으면 `JobRunner`가
/// 저장소의 기존 데이터를 확인해 엽니다.
#[derive(Clone, Default)]
pub struct PipelineGate {
    exchanges: Arc<AtomicBool>,
    tickers: Arc<AtomicBool>,
}

impl PipelineGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, stage: Stage) -> &AtomicBool {
        match stage {
            Stage::Exchanges => &self.exchanges,
            Stage::Tickers => &self.tickers,
        }
    }

    /// 단계 완료 표시
    pub fn open(&self, stage: Stage) {
        self.flag(stage).store(true, Ordering::Release);
    }

    pub fn is_open(&self, stage: Stage) -> bool {
        self.flag(stage).load(Ordering::Acquire)
    }

    /// 작업의 선행 단계가 준비되었는지
    pub fn allows(&self, kind: JobKind) -> bool {
        kind.requires().map_or(true, |stage| self.is_open(stage))
    }
}
