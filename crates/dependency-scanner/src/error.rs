//! 의존성 스캐너 에러 타입
//!
//! [`DependencyScannerError`]는 의존성 스캐너 모듈 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<DependencyScannerError> for DepwatchError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **Stale 경로**: `ArchiveNotFound` (캐시에서 제거 대상)
//! - **일시적 I/O**: `ArchiveOpen` (경로 유지, 다음 스캔에서 재시도)
//! - **아카이브/메타데이터 손상**: `InvalidArchive`, `MalformedMetadata`
//! - **중첩 아카이브**: `NestedEntryNotFound`, `NestedArchiveTooLarge`, `Scratch`
//! - **외부 협력자**: `ClassSource`, `Channel`
//! - **설정/직렬화**: `Config`, `Serialization`

use depwatch_core::error::{ConfigError, DepwatchError, PipelineError, ScanError};

/// 의존성 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DependencyScannerError {
    /// 아카이브 파일이 더 이상 존재하지 않음
    #[error("archive not found: {path}")]
    ArchiveNotFound {
        /// 아카이브 경로
        path: String,
    },

    /// 아카이브 파일 열기 실패 (권한 등)
    #[error("failed to open archive: {path}: {source}")]
    ArchiveOpen {
        /// 아카이브 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// zip 구조가 손상되었거나 읽을 수 없음
    #[error("invalid archive: {path}: {reason}")]
    InvalidArchive {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// pom.properties 또는 MANIFEST.MF 해석 실패
    #[error("malformed metadata: {path}!/{entry}: {reason}")]
    MalformedMetadata {
        /// 아카이브 경로
        path: String,
        /// 메타데이터 엔트리 이름
        entry: String,
        /// 실패 사유
        reason: String,
    },

    /// 중첩 아카이브 엔트리를 찾을 수 없음
    #[error("nested entry not found: {path}!/{entry}")]
    NestedEntryNotFound {
        /// 외부 아카이브 경로
        path: String,
        /// 내부 엔트리 경로
        entry: String,
    },

    /// 중첩 아카이브 크기 초과
    #[error("nested archive too large: {path}!/{entry}: more than {max} bytes")]
    NestedArchiveTooLarge {
        /// 외부 아카이브 경로
        path: String,
        /// 내부 엔트리 경로
        entry: String,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },

    /// 임시 파일 생성/쓰기 실패
    #[error("scratch file error: {reason}")]
    Scratch {
        /// 실패 사유
        reason: String,
    },

    /// 로드된 클래스 목록 조회 실패
    #[error("class source error: {0}")]
    ClassSource(String),

    /// 결과 직렬화 실패
    #[error("serialization error: {0}")]
    Serialization(String),

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl DependencyScannerError {
    /// 아카이브가 사라져 캐시에서 제거해야 하는 에러인지 확인합니다.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::ArchiveNotFound { .. })
    }

    /// 메트릭 레이블에 사용할 스킵 사유를 반환합니다.
    pub fn skip_reason(&self) -> &'static str {
        match self {
            Self::ArchiveNotFound { .. } => "stale",
            Self::ArchiveOpen { .. } => "unreadable",
            Self::InvalidArchive { .. } | Self::MalformedMetadata { .. } => "malformed",
            Self::NestedEntryNotFound { .. }
            | Self::NestedArchiveTooLarge { .. }
            | Self::Scratch { .. } => "nested",
            Self::ClassSource(_)
            | Self::Serialization(_)
            | Self::Channel(_)
            | Self::Config { .. } => "other",
        }
    }
}

impl From<DependencyScannerError> for DepwatchError {
    fn from(err: DependencyScannerError) -> Self {
        match err {
            DependencyScannerError::Config { field, reason } => {
                DepwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
            DependencyScannerError::Channel(msg) => {
                DepwatchError::Pipeline(PipelineError::ChannelSend(msg))
            }
            DependencyScannerError::ClassSource(msg) => {
                DepwatchError::Scan(ScanError::ClassSource(msg))
            }
            err @ (DependencyScannerError::MalformedMetadata { .. }
            | DependencyScannerError::InvalidArchive { .. }) => {
                DepwatchError::Scan(ScanError::Metadata(err.to_string()))
            }
            err @ (DependencyScannerError::ArchiveNotFound { .. }
            | DependencyScannerError::ArchiveOpen { .. }
            | DependencyScannerError::NestedEntryNotFound { .. }
            | DependencyScannerError::NestedArchiveTooLarge { .. }) => {
                DepwatchError::Scan(ScanError::Archive(err.to_string()))
            }
            err @ (DependencyScannerError::Scratch { .. }
            | DependencyScannerError::Serialization(_)) => {
                DepwatchError::Scan(ScanError::Failed(err.to_string()))
            }
        }
    }
}
