//! 의존성 스캔 이벤트
//!
//! [`DependencyScanEvent`]는 완료된 스캔 보고서를 담는 이벤트입니다.
//! core의 [`Event`] trait을 구현하여 `tokio::mpsc` 채널을 통한 전송이 가능합니다.

use std::fmt;

use depwatch_core::event::{EVENT_TYPE_INVENTORY, Event, EventMetadata, MODULE_DEPENDENCY_SCANNER};

use crate::report::ScanReport;

/// 의존성 인벤토리 이벤트
#[derive(Debug, Clone)]
pub struct DependencyScanEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 스캔 보고서
    pub report: ScanReport,
}

impl DependencyScanEvent {
    /// 새로운 trace를 시작하는 이벤트를 생성합니다.
    pub fn new(report: ScanReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_DEPENDENCY_SCANNER),
            report,
        }
    }

    /// 기존 trace에 연결된 이벤트를 생성합니다.
    pub fn with_trace(report: ScanReport, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_DEPENDENCY_SCANNER, trace_id),
            report,
        }
    }
}

impl Event for DependencyScanEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_INVENTORY
    }
}

impl fmt::Display for DependencyScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DependencyScanEvent[{}] trigger={} dependencies={}",
            &self.id[..8.min(self.id.len())],
            self.report.trigger,
            self.report.dependencies.len(),
        )
    }
}
