//! 파이프라인 trait -- 모듈 생명주기 정의
//!
//! 백그라운드 작업을 가진 모든 모듈은 [`Pipeline`]을 구현하여
//! 데몬에서 동일한 방식으로 시작/정지/상태 확인됩니다.
//!
//! ```text
//! Initialized → start() → Running → stop() → Stopped
//! ```

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::DepwatchError;

/// 모듈 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작하지만 일부 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 모듈 생명주기 trait
///
/// 구현체는 `async fn`으로 작성할 수 있으며, 반환 future는 `Send`여야 합니다.
pub trait Pipeline: Send + Sync {
    /// 백그라운드 작업을 시작합니다.
    ///
    /// 이미 실행 중이면 `PipelineError::AlreadyRunning`을 반환해야 합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), DepwatchError>> + Send;

    /// 백그라운드 작업을 정지합니다.
    ///
    /// 진행 중인 작업은 완료될 때까지 기다립니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), DepwatchError>> + Send;

    /// 현재 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
