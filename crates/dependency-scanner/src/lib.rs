//! depwatch 의존성 스캐너
//!
//! 실행 중인 JVM 프로세스에 로드된 클래스의 code-source 위치를 모아,
//! 각 JAR 아카이브의 정체성(product, version, vendor)을 식별하고
//! 중복이 제거된 인벤토리를 보고합니다.
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`DependencyScannerError`)
//! - [`config`]: 스캐너 설정 (`DependencyScannerConfig`, 빌더)
//! - [`types`]: 도메인 타입 (`Dependency`, `DependencySet`, `SourceKind`)
//! - [`archive`]: JAR 접근, manifest/properties 파서, 중첩 아카이브 추출
//! - [`resolver`]: 메타데이터 출처 체인 (`MetadataSource`, `ArchiveResolver`)
//! - [`cache`]: 관측 경로 캐시 (`PathCache`)
//! - [`source`]: 로드된 클래스 제공자 (`ClassSource`)
//! - [`engine`]: 동기 스캔 엔진 (`DependencyEngine`, `PathOutcome`)
//! - [`report`]: 스캔 보고서와 sink (`ScanReport`, `ReportSink`)
//! - [`event`]: 인벤토리 이벤트 (`DependencyScanEvent`)
//! - [`scanner`]: 오케스트레이터 (`DependencyScanner`, `Pipeline` impl)
//!
//! # Architecture
//!
//! ```text
//! ClassSource --> PathCache --> split_nested --> JarArchive --> ArchiveResolver
//!                    ^                               |                |
//!                    |                        extract_entry      Dependency
//!               forget (stale)                 (tempfile)             |
//!                                                                DependencySet
//!                                                                     |
//!                                                          LogSink / ChannelSink
//! ```

pub mod archive;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod source;
pub mod types;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{DependencyScanner, DependencyScannerBuilder, ScanHandle};

// Engine
pub use engine::{DependencyEngine, PathOutcome};

// Configuration
pub use config::{DependencyScannerConfig, DependencyScannerConfigBuilder};

// Error
pub use error::DependencyScannerError;

// Events & reports
pub use event::DependencyScanEvent;
pub use report::{ChannelSink, LogSink, ReportSink, ScanReport, ScanTrigger};

// Types
pub use types::{Dependency, DependencySet, SourceKind};

// Archive & resolution
pub use archive::{JarArchive, NestedPath, split_nested};
pub use cache::{PathCache, normalize_location};
pub use resolver::{ArchiveResolver, ManifestSource, MetadataSource, PomPropertiesSource};

// Class sources
pub use source::{ClassSource, LoadedClass, SnapshotFileSource, StaticClassSource};
