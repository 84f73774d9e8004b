//! 아카이브 메타데이터 해석 -- JAR에서 product/version/vendor 식별
//!
//! [`MetadataSource`] trait은 하나의 메타데이터 출처(pom.properties, manifest 속성 묶음)를
//! 나타냅니다. [`ArchiveResolver`]는 등록 순서대로 출처를 시도하고 처음 성공한 결과를 씁니다.
//!
//! # 기본 순서
//!
//! 1. [`PomPropertiesSource`] -- `META-INF/**/pom.properties`
//! 2. [`ManifestSource::implementation`] -- `Implementation-*`
//! 3. [`ManifestSource::specification`] -- `Specification-*`
//! 4. [`ManifestSource::bundle`] -- `Bundle-*` (OSGi)
//!
//! 모든 출처가 `None`이면 아카이브는 식별되지 않은 것으로 보며 에러가 아닙니다.
//! 출처가 에러를 반환하면 나머지 출처는 시도하지 않습니다.

pub mod manifest;
pub mod pom;

use crate::archive::JarArchive;
use crate::error::DependencyScannerError;
use crate::types::{Dependency, SourceKind};

pub use manifest::ManifestSource;
pub use pom::PomPropertiesSource;

/// 메타데이터 출처 trait
///
/// 각 구현은 독립적으로 테스트할 수 있어야 하며, 필요한 필드가 없으면
/// `Ok(None)`을 반환해 다음 출처로 넘어가게 합니다.
pub trait MetadataSource: Send + Sync {
    /// 이 출처가 생성하는 의존성의 출처 종류
    fn kind(&self) -> SourceKind;

    /// 열린 아카이브에서 의존성을 식별합니다.
    ///
    /// # Arguments
    ///
    /// - `archive`: 열린 아카이브
    /// - `observed_path`: 결과 [`Dependency::path`]에 기록할 관측 경로
    fn resolve(
        &self,
        archive: &mut JarArchive,
        observed_path: &str,
    ) -> Result<Option<Dependency>, DependencyScannerError>;
}

/// 순서가 있는 메타데이터 출처 체인
pub struct ArchiveResolver {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl ArchiveResolver {
    /// 기본 출처 순서로 생성합니다.
    pub fn new() -> Self {
        Self::with_sources(vec![
            Box::new(PomPropertiesSource),
            Box::new(ManifestSource::implementation()),
            Box::new(ManifestSource::specification()),
            Box::new(ManifestSource::bundle()),
        ])
    }

    /// 지정한 출처 목록으로 생성합니다.
    pub fn with_sources(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    /// 등록된 출처 종류를 순서대로 반환합니다.
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// 아카이브를 식별합니다. 첫 번째로 성공한 출처의 결과를 반환합니다.
    pub fn resolve(
        &self,
        archive: &mut JarArchive,
        observed_path: &str,
    ) -> Result<Option<Dependency>, DependencyScannerError> {
        for source in &self.sources {
            if let Some(dependency) = source.resolve(archive, observed_path)? {
                tracing::trace!(
                    path = %observed_path,
                    source = %source.kind(),
                    product = %dependency.product(),
                    "archive identified"
                );
                return Ok(Some(dependency));
            }
        }

        tracing::debug!(path = %observed_path, "no identifying metadata found");
        Ok(None)
    }
}

impl Default for ArchiveResolver {
    fn default() -> Self {
        Self::new()
    }
}
