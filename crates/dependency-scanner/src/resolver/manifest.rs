//! `MANIFEST.MF` 속성 기반 식별
//!
//! 세 가지 속성 묶음을 같은 구현으로 처리합니다. 묶음마다 제목, 버전,
//! 벤더 속성 이름이 다릅니다.

use crate::archive::JarArchive;
use crate::error::DependencyScannerError;
use crate::resolver::MetadataSource;
use crate::types::{Dependency, SourceKind};

/// manifest 메인 섹션의 속성 묶음 하나
#[derive(Debug, Clone)]
pub struct ManifestSource {
    kind: SourceKind,
    title: &'static str,
    version: &'static str,
    /// 앞의 이름부터 시도하며 값이 있는 첫 번째를 사용
    vendor: &'static [&'static str],
}

impl ManifestSource {
    /// `Implementation-Title` / `Implementation-Version`,
    /// 벤더는 `Implementation-Vendor-Id` 다음 `Implementation-Vendor`
    pub fn implementation() -> Self {
        Self {
            kind: SourceKind::ManifestImplementation,
            title: "Implementation-Title",
            version: "Implementation-Version",
            vendor: &["Implementation-Vendor-Id", "Implementation-Vendor"],
        }
    }

    /// `Specification-Title` / `Specification-Version` / `Specification-Vendor`
    pub fn specification() -> Self {
        Self {
            kind: SourceKind::ManifestSpecification,
            title: "Specification-Title",
            version: "Specification-Version",
            vendor: &["Specification-Vendor"],
        }
    }

    /// `Bundle-SymbolicName` / `Bundle-Version` / `Bundle-Vendor`
    ///
    /// `Bundle-SymbolicName`의 `;singleton:=true` 같은 OSGi 지시어는 제거합니다.
    pub fn bundle() -> Self {
        Self {
            kind: SourceKind::ManifestBundle,
            title: "Bundle-SymbolicName",
            version: "Bundle-Version",
            vendor: &["Bundle-Vendor"],
        }
    }
}

impl MetadataSource for ManifestSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn resolve(
        &self,
        archive: &mut JarArchive,
        observed_path: &str,
    ) -> Result<Option<Dependency>, DependencyScannerError> {
        let Some(manifest) = archive.manifest()? else {
            return Ok(None);
        };

        let (Some(title), Some(version)) = (
            manifest.main_attribute(self.title),
            manifest.main_attribute(self.version),
        ) else {
            return Ok(None);
        };

        let product = match self.kind {
            SourceKind::ManifestBundle => title.split(';').next().unwrap_or(title),
            _ => title,
        };

        let vendor = self
            .vendor
            .iter()
            .filter_map(|name| manifest.main_attribute(name))
            .find(|v| !v.trim().is_empty());

        Ok(Dependency::new(
            product,
            version,
            vendor,
            observed_path,
            self.kind,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::write_jar;

    fn resolve(source: ManifestSource, manifest: &str) -> Option<Dependency> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        write_jar(&path, &[("META-INF/MANIFEST.MF", manifest.as_bytes())]);
        let mut archive = JarArchive::open(&path).unwrap();
        source.resolve(&mut archive, "/lib/a.jar").unwrap()
    }

    #[test]
    fn implementation_prefers_vendor_id() {
        let dep = resolve(
            ManifestSource::implementation(),
            "Implementation-Title: commons-lang3\n\
Implementation-Version: 3.12.0\n\
Implementation-Vendor: The Apache Software Foundation\n\
Implementation-Vendor-Id: org.apache.commons\n",
        )
        .unwrap();

        assert_eq!(dep.product(), "commons-lang3");
        assert_eq!(dep.version(), "3.12.0");
        assert_eq!(dep.vendor(), Some("org.apache.commons"));
        assert_eq!(dep.source_kind(), SourceKind::ManifestImplementation);
    }

    #[test]
    fn implementation_falls_back_to_vendor_name() {
        let dep = resolve(
            ManifestSource::implementation(),
            "Implementation-Title: x\nImplementation-Version: 1\nImplementation-Vendor: Acme\n",
        )
        .unwrap();
        assert_eq!(dep.vendor(), Some("Acme"));
    }

    #[test]
    fn implementation_without_version_is_none() {
        assert!(resolve(ManifestSource::implementation(), "Implementation-Title: x\n").is_none());
    }

    #[test]
    fn specification_attributes() {
        let dep = resolve(
            ManifestSource::specification(),
            "Specification-Title: Java Servlet API\n\
Specification-Version: 4.0\n\
Specification-Vendor: Oracle\n",
        )
        .unwrap();
        assert_eq!(dep.product(), "Java Servlet API");
        assert_eq!(dep.vendor(), Some("Oracle"));
        assert_eq!(dep.source_kind(), SourceKind::ManifestSpecification);
    }

    #[test]
    fn bundle_strips_osgi_directives() {
        let dep = resolve(
            ManifestSource::bundle(),
            "Bundle-SymbolicName: org.eclipse.osgi; singleton:=true\nBundle-Version: 3.18.0\n",
        )
        .unwrap();
        assert_eq!(dep.product(), "org.eclipse.osgi");
        assert_eq!(dep.vendor(), None);
        assert_eq!(dep.source_kind(), SourceKind::ManifestBundle);
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let dep = resolve(
            ManifestSource::implementation(),
            "implementation-title: x\nIMPLEMENTATION-VERSION: 2\n",
        )
        .unwrap();
        assert_eq!(dep.version(), "2");
    }

    #[test]
    fn no_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        write_jar(&path, &[("A.class", b"x")]);
        let mut archive = JarArchive::open(&path).unwrap();
        assert!(
            ManifestSource::bundle()
                .resolve(&mut archive, "/lib/a.jar")
                .unwrap()
                .is_none()
        );
    }
}
