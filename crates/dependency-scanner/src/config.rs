//! 의존성 스캐너 설정
//!
//! [`DependencyScannerConfig`]는 core의 [`DependencyConfig`](depwatch_core::config::DependencyConfig)를
//! 확장하여 스캐너 고유 설정(중첩 아카이브 크기 제한, 복사 버퍼 크기)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use depwatch_dependency_scanner::DependencyScannerConfig;
//!
//! // 기본값으로 생성
//! let config = DependencyScannerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use depwatch_dependency_scanner::DependencyScannerConfigBuilder;
//!
//! let config = DependencyScannerConfigBuilder::new()
//!     .scan_interval_secs(3600)
//!     .initial_delay_secs(5)
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::error::DependencyScannerError;

/// 의존성 스캐너 설정
///
/// # 필드
///
/// - **enabled**: 스캐너 활성화 여부
/// - **scan_interval_secs**: 주기적 스캔 간격 (0이면 수동 트리거만)
/// - **initial_delay_secs**: 첫 주기 스캔까지의 지연 (0 불가)
/// - **max_cached_paths**: 경로 캐시 용량
/// - **snapshot_path**: 로드된 클래스 스냅샷 파일 경로
/// - **scratch_dir**: 중첩 아카이브 임시 파일 디렉토리 (빈 문자열이면 시스템 임시 디렉토리)
/// - **max_nested_archive_size**: 중첩 아카이브 최대 크기 (바이트)
/// - **copy_buffer_size**: 중첩 아카이브 복사 버퍼 크기 (바이트)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyScannerConfig {
    /// 스캐너 활성화 여부
    pub enabled: bool,
    /// 주기적 스캔 간격 (초). 0이면 수동 트리거만 가능
    pub scan_interval_secs: u64,
    /// 첫 주기 스캔 지연 (초)
    pub initial_delay_secs: u64,
    /// 경로 캐시 용량
    pub max_cached_paths: usize,
    /// 로드된 클래스 스냅샷 파일
    pub snapshot_path: String,
    /// 임시 파일 디렉토리
    pub scratch_dir: String,

    // --- 모듈 고유 확장 ---
    /// 중첩 아카이브 최대 크기 (바이트)
    pub max_nested_archive_size: u64,
    /// 복사 버퍼 크기 (바이트)
    pub copy_buffer_size: usize,
}

impl Default for DependencyScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 43_200, // 12 hours
            initial_delay_secs: 1,
            max_cached_paths: DEFAULT_CAPACITY,
            snapshot_path: "/var/run/depwatch/loaded-classes.tsv".to_owned(),
            scratch_dir: String::new(),
            max_nested_archive_size: 64 * 1024 * 1024, // 64 MB
            copy_buffer_size: 8 * 1024,
        }
    }
}

/// 설정 상한값 상수
const MIN_SCAN_INTERVAL_SECS: u64 = 60;
const MAX_SCAN_INTERVAL_SECS: u64 = 604_800; // 7 days
const MAX_INITIAL_DELAY_SECS: u64 = 3_600;
const MAX_CACHED_PATHS_LIMIT: usize = 100_000;
const MAX_NESTED_ARCHIVE_SIZE: u64 = 1024 * 1024 * 1024; // 1 GB
const MIN_COPY_BUFFER_SIZE: usize = 512;
const MAX_COPY_BUFFER_SIZE: usize = 1024 * 1024;
const MAX_PATH_LEN: usize = 4096;

impl DependencyScannerConfig {
    /// core의 `DependencyConfig`에서 스캐너 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &depwatch_core::config::DependencyConfig) -> Self {
        Self {
            enabled: core.enabled,
            scan_interval_secs: core.scan_interval_secs,
            initial_delay_secs: core.initial_delay_secs,
            max_cached_paths: core.max_cached_paths,
            snapshot_path: core.snapshot_path.clone(),
            scratch_dir: core.scratch_dir.clone(),
            ..Self::default()
        }
    }

    /// 임시 파일 디렉토리. 설정이 비어 있으면 시스템 임시 디렉토리입니다.
    pub fn scratch_dir_path(&self) -> PathBuf {
        if self.scratch_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.scratch_dir)
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `scan_interval_secs`: 0 또는 60-604800 (0은 수동 모드)
    /// - `initial_delay_secs`: 1-3600
    /// - `max_cached_paths`: 1-100000
    /// - `max_nested_archive_size`: 1-1073741824 (1GB)
    /// - `copy_buffer_size`: 512-1048576 (1MB)
    /// - `snapshot_path`, `scratch_dir`: `..` 포함 불가
    pub fn validate(&self) -> Result<(), DependencyScannerError> {
        if self.scan_interval_secs > 0
            && !(MIN_SCAN_INTERVAL_SECS..=MAX_SCAN_INTERVAL_SECS).contains(&self.scan_interval_secs)
        {
            return Err(config_error(
                "scan_interval_secs",
                format!("must be 0 (manual) or {MIN_SCAN_INTERVAL_SECS}-{MAX_SCAN_INTERVAL_SECS}"),
            ));
        }

        if !(1..=MAX_INITIAL_DELAY_SECS).contains(&self.initial_delay_secs) {
            return Err(config_error(
                "initial_delay_secs",
                format!("must be 1-{MAX_INITIAL_DELAY_SECS}"),
            ));
        }

        if !(1..=MAX_CACHED_PATHS_LIMIT).contains(&self.max_cached_paths) {
            return Err(config_error(
                "max_cached_paths",
                format!("must be 1-{MAX_CACHED_PATHS_LIMIT}"),
            ));
        }

        if !(1..=MAX_NESTED_ARCHIVE_SIZE).contains(&self.max_nested_archive_size) {
            return Err(config_error(
                "max_nested_archive_size",
                format!("must be 1-{MAX_NESTED_ARCHIVE_SIZE}"),
            ));
        }

        if !(MIN_COPY_BUFFER_SIZE..=MAX_COPY_BUFFER_SIZE).contains(&self.copy_buffer_size) {
            return Err(config_error(
                "copy_buffer_size",
                format!("must be {MIN_COPY_BUFFER_SIZE}-{MAX_COPY_BUFFER_SIZE}"),
            ));
        }

        validate_path("snapshot_path", &self.snapshot_path)?;
        validate_path("scratch_dir", &self.scratch_dir)?;

        Ok(())
    }
}

fn config_error(field: &str, reason: String) -> DependencyScannerError {
    DependencyScannerError::Config {
        field: field.to_owned(),
        reason,
    }
}

fn validate_path(field: &str, path: &str) -> Result<(), DependencyScannerError> {
    if Path::new(path)
        .components()
        .any(|c| c == Component::ParentDir)
    {
        return Err(config_error(
            field,
            format!("'{path}' contains path traversal pattern '..'"),
        ));
    }

    if path.len() > MAX_PATH_LEN {
        return Err(config_error(
            field,
            format!("path exceeds maximum length {MAX_PATH_LEN}"),
        ));
    }

    Ok(())
}

/// [`DependencyScannerConfig`] 빌더
///
/// 빌드 시 유효성 검증을 수행합니다.
#[derive(Default)]
pub struct DependencyScannerConfigBuilder {
    config: DependencyScannerConfig,
}

impl DependencyScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn scan_interval_secs(mut self, secs: u64) -> Self {
        self.config.scan_interval_secs = secs;
        self
    }

    pub fn initial_delay_secs(mut self, secs: u64) -> Self {
        self.config.initial_delay_secs = secs;
        self
    }

    pub fn max_cached_paths(mut self, max: usize) -> Self {
        self.config.max_cached_paths = max;
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<String>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    pub fn max_nested_archive_size(mut self, size: u64) -> Self {
        self.config.max_nested_archive_size = size;
        self
    }

    pub fn copy_buffer_size(mut self, size: usize) -> Self {
        self.config.copy_buffer_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `DependencyScannerError::Config` 반환
    pub fn build(self) -> Result<DependencyScannerConfig, DependencyScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
