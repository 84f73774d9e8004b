//! 의존성 스캐너 오케스트레이터 -- 주기적 스캔과 수동 스캔 관리
//!
//! [`DependencyScanner`]는 core의 [`Pipeline`] trait을 구현하여
//! `depwatch-daemon`에서 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//!  interval_at(initial_delay, period) ----+
//!                                         |
//!  scan_once() / scan_report() -----------+--> spawn_blocking(DependencyEngine::run)
//!                                                         |
//!                                                    ScanReport
//!                                                         |
//!                                       +-----------------+-----------------+
//!                                       |                                   |
//!                                    LogSink                          ChannelSink
//!                                                                          |
//!                                                               mpsc --> downstream
//! ```
//!
//! 주기적 스캔과 수동 스캔 모두 같은 [`DependencyEngine`]을 거치므로 경로 캐시를 공유하며
//! 스캔은 직렬화됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use depwatch_core::error::{DepwatchError, PipelineError};
use depwatch_core::pipeline::{HealthStatus, Pipeline};

use crate::config::DependencyScannerConfig;
use crate::engine::DependencyEngine;
use crate::error::DependencyScannerError;
use crate::event::DependencyScanEvent;
use crate::report::{ChannelSink, LogSink, ReportSink, ScanReport, ScanTrigger};
use crate::resolver::ArchiveResolver;
use crate::source::{ClassSource, SnapshotFileSource};

/// 스캐너 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScannerState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 주기적 태스크와 수동 호출이 공유하는 스캔 컨텍스트
struct ScanContext {
    engine: Arc<DependencyEngine>,
    sinks: Vec<Box<dyn ReportSink>>,
    scans_completed: AtomicU64,
    scans_failed: AtomicU64,
    last_scan_failed: AtomicBool,
}

impl ScanContext {
    /// 엔진을 blocking 스레드에서 실행하고 결과를 sink에 전달합니다.
    async fn execute(&self, trigger: ScanTrigger) -> Result<ScanReport, DependencyScannerError> {
        let engine = Arc::clone(&self.engine);
        let result = match tokio::task::spawn_blocking(move || engine.run(trigger)).await {
            Ok(result) => result,
            Err(e) => {
                metrics::counter!(
                    depwatch_core::metrics::DEPENDENCY_SCAN_FAILURES_TOTAL,
                    depwatch_core::metrics::LABEL_TRIGGER => trigger.as_str()
                )
                .increment(1);
                Err(DependencyScannerError::Channel(format!(
                    "spawn_blocking failed: {e}"
                )))
            }
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                self.scans_failed.fetch_add(1, Ordering::Relaxed);
                self.last_scan_failed.store(true, Ordering::Relaxed);
                return Err(e);
            }
        };

        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.last_scan_failed.store(false, Ordering::Relaxed);

        for sink in &self.sinks {
            if let Err(e) = sink.publish(&report) {
                warn!(scan_id = %report.scan_id, error = %e, "failed to publish scan report");
            }
        }

        info!(
            scan_id = %report.scan_id,
            trigger = %trigger,
            dependencies = report.dependencies.len(),
            cached = report.paths_cached,
            evicted = report.paths_evicted,
            skipped = report.archives_skipped,
            duration_ms = report.duration_ms,
            "dependency scan completed"
        );

        Ok(report)
    }
}

/// 의존성 스캐너
///
/// # 재시작
///
/// `stop()` 후 `start()`를 다시 호출하면 새 취소 토큰으로 주기적 태스크를 다시 시작합니다.
/// 경로 캐시는 재시작 후에도 유지됩니다.
pub struct DependencyScanner {
    /// 스캐너 설정
    config: DependencyScannerConfig,
    /// 현재 상태
    state: ScannerState,
    /// 공유 스캔 컨텍스트
    context: Arc<ScanContext>,
    /// 주기적 태스크 취소 토큰
    cancel: CancellationToken,
    /// 백그라운드 태스크 핸들
    tasks: Vec<JoinHandle<()>>,
}

impl DependencyScanner {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            ScannerState::Initialized => "initialized",
            ScannerState::Running => "running",
            ScannerState::Stopped => "stopped",
        }
    }

    pub fn config(&self) -> &DependencyScannerConfig {
        &self.config
    }

    /// 완료된 스캔 수를 반환합니다.
    pub fn scans_completed(&self) -> u64 {
        self.context.scans_completed.load(Ordering::Relaxed)
    }

    /// 실패한 스캔 수를 반환합니다.
    pub fn scans_failed(&self) -> u64 {
        self.context.scans_failed.load(Ordering::Relaxed)
    }

    /// 공유 엔진 핸들
    pub fn engine(&self) -> Arc<DependencyEngine> {
        Arc::clone(&self.context.engine)
    }

    /// 단일 스캔을 수행합니다 (수동 트리거용).
    ///
    /// 다른 스캔이 진행 중이면 끝날 때까지 기다린 뒤 새로 스캔합니다.
    pub async fn scan_once(&self) -> Result<ScanReport, DependencyScannerError> {
        self.context.execute(ScanTrigger::OnDemand).await
    }

    /// 단일 스캔을 수행하고 의존성 JSON 배열을 반환합니다.
    pub async fn scan_report(&self) -> Result<String, DependencyScannerError> {
        self.scan_once().await?.inventory_json()
    }

    /// 수동 스캔 핸들을 만듭니다. 명령 리스너 등 다른 태스크에 넘길 때 사용합니다.
    pub fn handle(&self) -> ScanHandle {
        ScanHandle {
            context: Arc::clone(&self.context),
        }
    }
}

/// 수동 스캔 핸들
///
/// 스캐너 생명주기와 무관하게 복제하여 다른 태스크에서 사용할 수 있습니다.
#[derive(Clone)]
pub struct ScanHandle {
    context: Arc<ScanContext>,
}

impl ScanHandle {
    /// 단일 스캔을 수행하고 의존성 JSON 배열을 반환합니다.
    pub async fn scan_report(&self) -> Result<String, DependencyScannerError> {
        self.context
            .execute(ScanTrigger::OnDemand)
            .await?
            .inventory_json()
    }
}

impl std::fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHandle").finish_non_exhaustive()
    }
}

impl Pipeline for DependencyScanner {
    async fn start(&mut self) -> Result<(), DepwatchError> {
        if self.state == ScannerState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!("starting dependency scanner");

        self.cancel = CancellationToken::new();

        // 주기적 스캔 태스크 스폰 (scan_interval_secs > 0인 경우)
        if self.config.scan_interval_secs > 0 {
            let period = Duration::from_secs(self.config.scan_interval_secs);
            let initial_delay = Duration::from_secs(self.config.initial_delay_secs);
            let context = Arc::clone(&self.context);
            let cancel = self.cancel.clone();

            let task = tokio::spawn(async move {
                let mut interval = tokio::time::interval_at(Instant::now() + initial_delay, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = interval.tick() => {}
                    }

                    // 스캔은 select! 밖에서 실행되어 취소되어도 끝까지 완료됩니다.
                    if let Err(e) = context.execute(ScanTrigger::Periodic).await {
                        error!(error = %e, "periodic dependency scan failed");
                    }
                }

                info!("periodic scan task stopped");
            });

            self.tasks.push(task);
            info!(
                interval_secs = self.config.scan_interval_secs,
                initial_delay_secs = self.config.initial_delay_secs,
                "periodic scan task spawned"
            );
        } else {
            info!("scan_interval_secs is 0, on-demand scans only");
        }

        self.state = ScannerState::Running;
        info!("dependency scanner started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DepwatchError> {
        if self.state != ScannerState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping dependency scanner");

        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "periodic scan task ended abnormally");
            }
        }

        self.state = ScannerState::Stopped;
        info!("dependency scanner stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            ScannerState::Running => {
                if self.context.last_scan_failed.load(Ordering::Relaxed) {
                    HealthStatus::Degraded("last dependency scan failed".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            ScannerState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            ScannerState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 의존성 스캐너 빌더
///
/// 스캐너를 구성하고 필요한 채널을 생성합니다.
pub struct DependencyScannerBuilder {
    config: DependencyScannerConfig,
    class_source: Option<Arc<dyn ClassSource>>,
    resolver: Option<ArchiveResolver>,
    sinks: Vec<Box<dyn ReportSink>>,
    event_tx: Option<mpsc::Sender<DependencyScanEvent>>,
    event_channel_capacity: usize,
}

impl DependencyScannerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DependencyScannerConfig::default(),
            class_source: None,
            resolver: None,
            sinks: Vec::new(),
            event_tx: None,
            event_channel_capacity: 16,
        }
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: DependencyScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 로드된 클래스 제공자를 지정합니다.
    ///
    /// 지정하지 않으면 설정의 `snapshot_path`를 읽는 [`SnapshotFileSource`]를 사용합니다.
    pub fn class_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.class_source = Some(source);
        self
    }

    /// 메타데이터 출처 체인을 지정합니다.
    pub fn resolver(mut self, resolver: ArchiveResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 추가 보고서 sink를 등록합니다.
    pub fn sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// 외부 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<DependencyScanEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 이벤트 채널 용량을 설정합니다 (외부 채널 미사용 시).
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// 스캐너를 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `DependencyScanner`: 스캐너 인스턴스
    /// - `Option<mpsc::Receiver<DependencyScanEvent>>`: 이벤트 수신 채널
    ///   (외부 event_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(DependencyScanner, Option<mpsc::Receiver<DependencyScanEvent>>), DependencyScannerError>
    {
        self.config.validate()?;

        if self.event_tx.is_none() && self.event_channel_capacity == 0 {
            return Err(DependencyScannerError::Config {
                field: "event_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let (event_tx, event_rx) = match self.event_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.event_channel_capacity);
                (tx, Some(rx))
            }
        };

        let class_source = self.class_source.unwrap_or_else(|| {
            Arc::new(SnapshotFileSource::new(&self.config.snapshot_path)) as Arc<dyn ClassSource>
        });

        let mut engine = DependencyEngine::new(&self.config, class_source);
        if let Some(resolver) = self.resolver {
            engine = engine.with_resolver(resolver);
        }

        let mut sinks: Vec<Box<dyn ReportSink>> =
            vec![Box::new(LogSink), Box::new(ChannelSink::new(event_tx))];
        sinks.extend(self.sinks);

        let scanner = DependencyScanner {
            config: self.config,
            state: ScannerState::Initialized,
            context: Arc::new(ScanContext {
                engine: Arc::new(engine),
                sinks,
                scans_completed: AtomicU64::new(0),
                scans_failed: AtomicU64::new(0),
                last_scan_failed: AtomicBool::new(false),
            }),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        };

        Ok((scanner, event_rx))
    }
}

impl Default for DependencyScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticClassSource;

    fn builder() -> DependencyScannerBuilder {
        DependencyScannerBuilder::new().class_source(Arc::new(StaticClassSource::default()))
    }

    #[test]
    fn builder_creates_scanner() {
        let (scanner, event_rx) = builder().build().unwrap();
        assert_eq!(scanner.state_name(), "initialized");
        assert!(event_rx.is_some());
    }

    #[test]
    fn builder_with_external_event_sender() {
        let (tx, _rx) = mpsc::channel(10);
        let (_scanner, rx) = builder().event_sender(tx).build().unwrap();
        assert!(rx.is_none());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = builder()
            .config(DependencyScannerConfig {
                initial_delay_secs: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_zero_channel_capacity() {
        assert!(builder().event_channel_capacity(0).build().is_err());
    }

    #[test]
    fn scanner_initial_counters() {
        let (scanner, _) = builder().build().unwrap();
        assert_eq!(scanner.scans_completed(), 0);
        assert_eq!(scanner.scans_failed(), 0);
    }

    #[tokio::test]
    async fn health_check_before_start() {
        let (scanner, _) = builder().build().unwrap();
        assert!(scanner.health_check().await.is_unhealthy());
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let (mut scanner, _) = builder().build().unwrap();
        assert!(scanner.stop().await.is_err());
    }

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let (mut scanner, _) = builder().build().unwrap();

        scanner.start().await.unwrap();
        assert_eq!(scanner.state_name(), "running");
        assert!(scanner.health_check().await.is_healthy());

        // Double start fails
        assert!(scanner.start().await.is_err());

        scanner.stop().await.unwrap();
        assert_eq!(scanner.state_name(), "stopped");
        assert!(scanner.stop().await.is_err());

        // Restart
        scanner.start().await.unwrap();
        scanner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn scan_once_with_no_classes() {
        let (scanner, mut rx) = builder().build().unwrap();

        let report = scanner.scan_once().await.unwrap();
        assert!(report.dependencies.is_empty());
        assert_eq!(report.trigger, ScanTrigger::OnDemand);
        assert_eq!(scanner.scans_completed(), 1);

        let event = rx.as_mut().unwrap().recv().await.unwrap();
        assert_eq!(event.report.scan_id, report.scan_id);
    }

    #[tokio::test]
    async fn scan_report_is_json_array() {
        let (scanner, _rx) = builder().build().unwrap();
        assert_eq!(scanner.scan_report().await.unwrap(), "[]");
        assert_eq!(scanner.handle().scan_report().await.unwrap(), "[]");
        assert_eq!(scanner.scans_completed(), 2);
    }

    #[tokio::test]
    async fn full_event_channel_does_not_fail_scan() {
        let (scanner, _rx) = builder().event_channel_capacity(1).build().unwrap();
        scanner.scan_once().await.unwrap();
        scanner.scan_once().await.unwrap();
        assert_eq!(scanner.scans_completed(), 2);
    }
}
