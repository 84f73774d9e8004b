//! `pom.properties` 기반 식별
//!
//! Maven은 빌드한 JAR의 `META-INF/maven/{groupId}/{artifactId}/pom.properties`에
//! 좌표를 기록합니다. 파일은 ISO-8859-1로 쓰이므로 바이트를 그대로 문자로 변환합니다.

use crate::archive::{JarArchive, Properties};
use crate::error::DependencyScannerError;
use crate::resolver::MetadataSource;
use crate::types::{Dependency, SourceKind};

/// `META-INF`로 시작하고 `pom.properties`로 끝나는 첫 번째 파일 엔트리를 읽습니다.
///
/// | 속성        | 필드    |
/// |-------------|---------|
/// | artifactId  | product |
/// | version     | version |
/// | groupId     | vendor  |
#[derive(Debug, Clone, Copy, Default)]
pub struct PomPropertiesSource;

impl PomPropertiesSource {
    fn find_entry(archive: &JarArchive) -> Option<String> {
        archive
            .entry_names()
            .find(|name| {
                name.starts_with("META-INF")
                    && name.ends_with("pom.properties")
                    && !name.ends_with('/')
            })
            .map(str::to_owned)
    }
}

impl MetadataSource for PomPropertiesSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pom
    }

    fn resolve(
        &self,
        archive: &mut JarArchive,
        observed_path: &str,
    ) -> Result<Option<Dependency>, DependencyScannerError> {
        let Some(entry) = Self::find_entry(archive) else {
            return Ok(None);
        };

        let Some(bytes) = archive.read_metadata_entry(&entry)? else {
            return Ok(None);
        };

        let content: String = bytes.iter().map(|&b| char::from(b)).collect();
        let props = Properties::parse(&content);

        let (Some(product), Some(version)) = (props.get("artifactId"), props.get("version"))
        else {
            tracing::debug!(path = %observed_path, entry = %entry, "pom.properties missing artifactId or version");
            return Ok(None);
        };

        Ok(Dependency::new(
            product,
            version,
            props.get("groupId"),
            observed_path,
            SourceKind::Pom,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::write_jar;

    fn resolve(entries: &[(&str, &[u8])]) -> Option<Dependency> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        write_jar(&path, entries);
        let mut archive = JarArchive::open(&path).unwrap();
        PomPropertiesSource
            .resolve(&mut archive, "/lib/a.jar")
            .unwrap()
    }

    #[test]
    fn reads_maven_coordinates() {
        let dep = resolve(&[(
            "META-INF/maven/org.slf4j/slf4j-api/pom.properties",
            b"#Generated by Maven\nversion=2.0.7\ngroupId=org.slf4j\nartifactId=slf4j-api\n",
        )])
        .unwrap();

        assert_eq!(dep.product(), "slf4j-api");
        assert_eq!(dep.version(), "2.0.7");
        assert_eq!(dep.vendor(), Some("org.slf4j"));
        assert_eq!(dep.path(), "/lib/a.jar");
        assert_eq!(dep.source_kind(), SourceKind::Pom);
    }

    #[test]
    fn reads_cr_only_pom_properties() {
        let dep = resolve(&[(
            "META-INF/maven/g/a/pom.properties",
            b"groupId=g\rartifactId=a\rversion=1.0\r",
        )])
        .unwrap();

        assert_eq!(dep.product(), "a");
        assert_eq!(dep.version(), "1.0");
        assert_eq!(dep.vendor(), Some("g"));
    }

    #[test]
    fn missing_group_id_gives_no_vendor() {
        let dep = resolve(&[(
            "META-INF/maven/x/y/pom.properties",
            b"artifactId=y\nversion=1.0\n",
        )])
        .unwrap();
        assert_eq!(dep.vendor(), None);
    }

    #[test]
    fn missing_version_is_none() {
        assert!(resolve(&[("META-INF/maven/x/y/pom.properties", b"artifactId=y\n")]).is_none());
    }

    #[test]
    fn blank_artifact_id_is_none() {
        assert!(
            resolve(&[(
                "META-INF/maven/x/y/pom.properties",
                b"artifactId=\nversion=1\n"
            )])
            .is_none()
        );
    }

    #[test]
    fn ignores_entries_outside_meta_inf() {
        assert!(resolve(&[("pom.properties", b"artifactId=y\nversion=1\n")]).is_none());
    }

    #[test]
    fn ignores_directory_entries() {
        assert!(resolve(&[("META-INF/weird-pom.properties/", b"")]).is_none());
    }

    #[test]
    fn first_matching_entry_wins() {
        let dep = resolve(&[
            ("META-INF/maven/a/first/pom.properties", b"artifactId=first\nversion=1\n"),
            ("META-INF/maven/b/second/pom.properties", b"artifactId=second\nversion=2\n"),
        ])
        .unwrap();
        assert_eq!(dep.product(), "first");
    }

    #[test]
    fn decodes_latin1_bytes() {
        let dep = resolve(&[(
            "META-INF/maven/x/y/pom.properties",
            b"artifactId=caf\xe9\nversion=1\n",
        )])
        .unwrap();
        assert_eq!(dep.product(), "café");
    }
}
