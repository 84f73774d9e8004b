//! depwatch 공통 크레이트
//!
//! 모든 depwatch 모듈이 공유하는 에러, 설정, 파이프라인 생명주기,
//! 이벤트 메타데이터, 메트릭 이름을 정의합니다.
//!
//! # Module Structure
//!
//! - [`error`]: 최상위 에러 타입 (`DepwatchError`)
//! - [`config`]: `depwatch.toml` 파싱 및 환경변수 오버라이드 (`DepwatchConfig`)
//! - [`pipeline`]: 모듈 생명주기 trait (`Pipeline`, `HealthStatus`)
//! - [`event`]: 모듈 간 이벤트 공통 인터페이스 (`Event`, `EventMetadata`)
//! - [`metrics`]: Prometheus 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DepwatchError, PipelineError, ScanError};

// 설정
pub use config::DepwatchConfig;

// 이벤트
pub use event::{Event, EventMetadata};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};
