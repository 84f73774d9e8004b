//! 스캔 결과 보고
//!
//! [`ScanReport`]는 한 번의 스캔 결과와 통계입니다.
//! [`ReportSink`] 구현은 스캔이 끝날 때마다 보고서를 받습니다.
//!
//! - [`LogSink`]: `info` 레벨 로그 한 건으로 JSON 인벤토리 기록
//! - [`ChannelSink`]: [`DependencyScanEvent`]를 `tokio::mpsc` 채널로 전송

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::DependencyScannerError;
use crate::event::DependencyScanEvent;
use crate::types::DependencySet;

/// 스캔 트리거 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanTrigger {
    /// 주기적 스케줄
    Periodic,
    /// 수동 요청
    OnDemand,
}

impl ScanTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for ScanTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 번의 스캔 결과
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// 스캔 고유 ID
    pub scan_id: String,
    /// 트리거 종류
    pub trigger: ScanTrigger,
    /// 식별된 의존성
    pub dependencies: DependencySet,
    /// 이번 스캔에서 새로 캐시에 들어간 경로 수
    pub paths_observed: usize,
    /// 스캔 종료 시점의 캐시 크기
    pub paths_cached: usize,
    /// 이번 스캔에서 제거된 stale 경로 수
    pub paths_evicted: usize,
    /// 건너뛴 아카이브 수 (열기 실패 + 아카이브별 해석 실패)
    pub archives_skipped: usize,
    /// 소요 시간 (밀리초)
    pub duration_ms: u64,
    /// 완료 시각
    pub completed_at: SystemTime,
}

impl ScanReport {
    /// 의존성 배열 JSON (명령 응답 본문)
    pub fn inventory_json(&self) -> Result<String, DependencyScannerError> {
        self.dependencies.to_json()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scan {} ({}) dependencies={} cached={} evicted={} skipped={} in {}ms",
            &self.scan_id[..8.min(self.scan_id.len())],
            self.trigger,
            self.dependencies.len(),
            self.paths_cached,
            self.paths_evicted,
            self.archives_skipped,
            self.duration_ms,
        )
    }
}

/// 스캔 보고서 수신자
pub trait ReportSink: Send + Sync {
    /// 완료된 스캔 보고서를 전달합니다.
    ///
    /// 실패해도 스캔 결과에는 영향을 주지 않으며, 호출자가 로그로 남깁니다.
    fn publish(&self, report: &ScanReport) -> Result<(), DependencyScannerError>;
}

/// 인벤토리를 로그로 기록하는 sink
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn publish(&self, report: &ScanReport) -> Result<(), DependencyScannerError> {
        let inventory = report.inventory_json()?;
        info!(
            scan_id = %report.scan_id,
            trigger = %report.trigger,
            dependencies = report.dependencies.len(),
            inventory = %inventory,
            "dependency inventory"
        );
        Ok(())
    }
}

/// 스캔 이벤트를 채널로 보내는 sink
///
/// 채널이 가득 차면 이벤트를 버리고 에러를 반환합니다 (블로킹하지 않음).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<DependencyScanEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<DependencyScanEvent>) -> Self {
        Self { tx }
    }
}

impl ReportSink for ChannelSink {
    fn publish(&self, report: &ScanReport) -> Result<(), DependencyScannerError> {
        self.tx
            .try_send(DependencyScanEvent::new(report.clone()))
            .map_err(|e| DependencyScannerError::Channel(e.to_string()))
    }
}
