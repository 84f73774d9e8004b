//! 로드된 클래스 목록 -- 관측 단계의 입력
//!
//! [`ClassSource`]는 대상 프로세스에 현재 로드된 클래스와 각 클래스의
//! code-source 위치를 제공합니다. 바이트코드 계측 에이전트가 실제 구현을 담당하며,
//! 이 크레이트는 두 가지 구현을 제공합니다.
//!
//! - [`StaticClassSource`]: 메모리 내 목록 (교체 가능)
//! - [`SnapshotFileSource`]: 에이전트가 기록한 스냅샷 파일
//!
//! # 스냅샷 파일 형식
//!
//! ```text
//! # class_name<TAB>location
//! org.slf4j.LoggerFactory	file:/app/lib/slf4j-api-2.0.7.jar
//! java.lang.String
//! ```

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::DependencyScannerError;

/// 로드된 클래스 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
    /// 클래스 이름
    pub class_name: String,
    /// code-source 위치. 부트스트랩 클래스 등은 위치가 없습니다.
    pub code_source: Option<String>,
}

impl LoadedClass {
    pub fn new(class_name: impl Into<String>, code_source: Option<&str>) -> Self {
        Self {
            class_name: class_name.into(),
            code_source: code_source.map(str::to_owned),
        }
    }
}

/// 로드된 클래스 목록 제공자
pub trait ClassSource: Send + Sync {
    /// 현재 로드된 모든 클래스를 반환합니다.
    fn loaded_classes(&self) -> Result<Vec<LoadedClass>, DependencyScannerError>;
}

/// 메모리 내 클래스 목록
#[derive(Debug, Default)]
pub struct StaticClassSource {
    classes: RwLock<Vec<LoadedClass>>,
}

impl StaticClassSource {
    pub fn new(classes: Vec<LoadedClass>) -> Self {
        Self {
            classes: RwLock::new(classes),
        }
    }

    /// 목록 전체를 교체합니다.
    pub fn replace(&self, classes: Vec<LoadedClass>) {
        let mut guard = self.classes.write().unwrap_or_else(|e| e.into_inner());
        *guard = classes;
    }

    /// 클래스를 추가합니다.
    pub fn push(&self, class: LoadedClass) {
        let mut guard = self.classes.write().unwrap_or_else(|e| e.into_inner());
        guard.push(class);
    }
}

impl ClassSource for StaticClassSource {
    fn loaded_classes(&self) -> Result<Vec<LoadedClass>, DependencyScannerError> {
        let guard = self.classes.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }
}

/// 스냅샷 파일에서 클래스 목록을 읽습니다.
///
/// 파일은 조회할 때마다 새로 읽습니다. 파일이 없으면 빈 목록입니다.
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 스냅샷 텍스트를 파싱합니다.
    pub fn parse(content: &str) -> Vec<LoadedClass> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| match line.split_once('\t') {
                Some((name, location)) => {
                    let location = location.trim();
                    LoadedClass::new(name.trim(), (!location.is_empty()).then_some(location))
                }
                None => LoadedClass::new(line, None),
            })
            .collect()
    }
}

impl ClassSource for SnapshotFileSource {
    fn loaded_classes(&self) -> Result<Vec<LoadedClass>, DependencyScannerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "class snapshot not found");
                Ok(Vec::new())
            }
            Err(e) => Err(DependencyScannerError::ClassSource(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }
}
