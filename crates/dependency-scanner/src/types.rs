//! 도메인 타입 -- 식별된 의존성과 스캔 결과 집합
//!
//! [`Dependency`]는 하나의 JAR 아카이브에서 식별된 소프트웨어 정체성
//! (product, version, vendor)을 나타냅니다.
//! [`DependencySet`]은 한 번의 스캔 결과로, 중복이 제거된 정렬 집합입니다.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::DependencyScannerError;

/// 메타데이터 출처
///
/// 보고용 진단 정보로만 사용되며 의존성 동일성 비교에는 포함되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `META-INF/**/pom.properties`
    Pom,
    /// `Implementation-*` manifest 속성
    ManifestImplementation,
    /// `Specification-*` manifest 속성
    ManifestSpecification,
    /// `Bundle-*` (OSGi) manifest 속성
    ManifestBundle,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pom => write!(f, "pom"),
            Self::ManifestImplementation => write!(f, "manifest_implementation"),
            Self::ManifestSpecification => write!(f, "manifest_specification"),
            Self::ManifestBundle => write!(f, "manifest_bundle"),
        }
    }
}

/// 식별된 서드파티 아카이브
///
/// 동일성은 `(product, version, vendor, path)`로 결정됩니다.
/// 같은 아카이브가 서로 다른 메타데이터 출처로 두 번 식별되어도
/// 결과 집합에는 하나만 남습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    product: String,
    version: String,
    vendor: Option<String>,
    path: String,
    #[serde(rename = "source")]
    source_kind: SourceKind,
}

impl Dependency {
    /// 새 의존성을 생성합니다.
    ///
    /// product 또는 version이 비어 있으면 `None`을 반환합니다.
    /// 공백뿐인 vendor는 `None`으로 정규화됩니다.
    pub(crate) fn new(
        product: &str,
        version: &str,
        vendor: Option<&str>,
        path: &str,
        source_kind: SourceKind,
    ) -> Option<Self> {
        let product = product.trim();
        let version = version.trim();
        if product.is_empty() || version.is_empty() {
            return None;
        }

        let vendor = vendor
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        Some(Self {
            product: product.to_owned(),
            version: version.to_owned(),
            vendor,
            path: path.to_owned(),
            source_kind,
        })
    }

    /// 제품명 (artifactId, Implementation-Title 등)
    pub fn product(&self) -> &str {
        &self.product
    }

    /// 버전
    pub fn version(&self) -> &str {
        &self.version
    }

    /// 벤더 (groupId, Implementation-Vendor 등)
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// 관측된 원본 경로 (중첩 경로 포함 가능)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 메타데이터 출처
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    fn identity(&self) -> (&str, &str, Option<&str>, &str) {
        (
            &self.product,
            &self.version,
            self.vendor.as_deref(),
            &self.path,
        )
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} vendor={} ({})",
            self.product,
            self.version,
            self.vendor.as_deref().unwrap_or("-"),
            self.path,
        )
    }
}

/// 한 번의 스캔 결과
///
/// 스캔마다 새로 생성되며 이전 스캔 결과와 누적되지 않습니다.
/// JSON으로는 [`Dependency`] 객체 배열로 직렬화됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet {
    dependencies: BTreeSet<Dependency>,
}

impl DependencySet {
    /// 빈 결과 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 의존성을 추가합니다. 이미 같은 정체성이 있으면 `false`를 반환합니다.
    pub fn insert(&mut self, dependency: Dependency) -> bool {
        self.dependencies.insert(dependency)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.dependencies.contains(dependency)
    }

    /// 정렬된 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    /// 제품명으로 의존성을 찾습니다.
    pub fn find_by_product(&self, product: &str) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.product == product)
            .collect()
    }

    /// JSON 배열로 직렬화합니다.
    pub fn to_json(&self) -> Result<String, DependencyScannerError> {
        serde_json::to_string(self).map_err(|e| DependencyScannerError::Serialization(e.to_string()))
    }
}

impl Extend<Dependency> for DependencySet {
    fn extend<I: IntoIterator<Item = Dependency>>(&mut self, iter: I) {
        self.dependencies.extend(iter);
    }
}

impl IntoIterator for DependencySet {
    type Item = Dependency;
    type IntoIter = std::collections::btree_set::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.into_iter()
    }
}
