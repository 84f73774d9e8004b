//! JAR 아카이브 접근 -- zip 읽기, 메타데이터 엔트리, 중첩 아카이브
//!
//! [`JarArchive`]는 열린 JAR 파일 핸들입니다. 핸들은 스코프를 벗어나면
//! 닫히므로, 해석 단계가 어떤 경로로 끝나더라도 파일 디스크립터가 남지 않습니다.
//!
//! # 하위 모듈
//!
//! - [`manifest`]: `META-INF/MANIFEST.MF` 메인 섹션 파서
//! - [`properties`]: `pom.properties` 파서
//! - [`nested`]: `outer.jar!/inner.jar` 경로 분리 및 임시 파일 추출

pub mod manifest;
pub mod nested;
pub mod properties;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::DependencyScannerError;

pub use manifest::Manifest;
pub use nested::{NestedPath, split_nested};
pub use properties::Properties;

/// manifest 엔트리 이름
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// 메타데이터 엔트리(manifest, pom.properties) 최대 크기
pub const MAX_METADATA_ENTRY_SIZE: u64 = 1024 * 1024;

/// 열린 JAR 아카이브
pub struct JarArchive {
    /// 에러 메시지와 로그에 쓰이는 경로 (중첩 아카이브는 관측 경로)
    display_path: String,
    zip: ZipArchive<BufReader<File>>,
    /// `None`: 아직 읽지 않음, `Some(None)`: manifest 없음
    manifest: Option<Option<Manifest>>,
}

impl JarArchive {
    /// 파일 시스템 경로의 아카이브를 엽니다.
    ///
    /// # Errors
    ///
    /// - 파일이 없으면 `ArchiveNotFound` (stale 경로)
    /// - 그 외 열기 실패는 `ArchiveOpen`
    /// - zip 구조가 잘못되었으면 `InvalidArchive`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DependencyScannerError> {
        let path = path.as_ref();
        Self::open_as(path, &path.display().to_string())
    }

    /// 아카이브를 열되, 에러와 로그에는 `display_path`를 사용합니다.
    pub fn open_as(path: &Path, display_path: &str) -> Result<Self, DependencyScannerError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DependencyScannerError::ArchiveNotFound {
                    path: display_path.to_owned(),
                }
            } else {
                DependencyScannerError::ArchiveOpen {
                    path: display_path.to_owned(),
                    source: e,
                }
            }
        })?;

        let zip = ZipArchive::new(BufReader::new(file)).map_err(|e| match e {
            ZipError::Io(source) => DependencyScannerError::ArchiveOpen {
                path: display_path.to_owned(),
                source,
            },
            other => DependencyScannerError::InvalidArchive {
                path: display_path.to_owned(),
                reason: other.to_string(),
            },
        })?;

        Ok(Self {
            display_path: display_path.to_owned(),
            zip,
            manifest: None,
        })
    }

    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    /// 엔트리 수
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.is_empty()
    }

    /// central directory 순서대로 엔트리 이름을 순회합니다.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        (0..self.zip.len()).filter_map(|i| self.zip.name_for_index(i))
    }

    /// 엔트리 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.zip.index_for_name(name).is_some()
    }

    /// 엔트리를 읽기 스트림으로 열어 `f`에 넘깁니다.
    ///
    /// 엔트리가 없거나 디렉토리이면 `Ok(None)`을 반환합니다.
    pub fn with_entry<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut dyn Read) -> Result<T, DependencyScannerError>,
    ) -> Result<Option<T>, DependencyScannerError> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(DependencyScannerError::InvalidArchive {
                    path: self.display_path.clone(),
                    reason: format!("{name}: {e}"),
                });
            }
        };

        if entry.is_dir() {
            return Ok(None);
        }

        f(&mut entry).map(Some)
    }

    /// 메타데이터 엔트리를 바이트로 읽습니다 ([`MAX_METADATA_ENTRY_SIZE`] 제한).
    pub fn read_metadata_entry(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<u8>>, DependencyScannerError> {
        let path = self.display_path.clone();
        self.with_entry(name, |reader| {
            let mut buf = Vec::new();
            reader
                .take(MAX_METADATA_ENTRY_SIZE + 1)
                .read_to_end(&mut buf)
                .map_err(|e| DependencyScannerError::InvalidArchive {
                    path: path.clone(),
                    reason: format!("{name}: {e}"),
                })?;

            if buf.len() as u64 > MAX_METADATA_ENTRY_SIZE {
                return Err(DependencyScannerError::MalformedMetadata {
                    path,
                    entry: name.to_owned(),
                    reason: format!("entry exceeds {MAX_METADATA_ENTRY_SIZE} bytes"),
                });
            }

            Ok(buf)
        })
    }

    /// manifest 메인 섹션을 반환합니다. 처음 호출 시 한 번만 읽습니다.
    ///
    /// manifest 엔트리가 없으면 `Ok(None)`입니다.
    pub fn manifest(&mut self) -> Result<Option<&Manifest>, DependencyScannerError> {
        if self.manifest.is_none() {
            let loaded = self.load_manifest()?;
            self.manifest = Some(loaded);
        }
        Ok(self.manifest.as_ref().and_then(Option::as_ref))
    }

    fn load_manifest(&mut self) -> Result<Option<Manifest>, DependencyScannerError> {
        let entry_name = if self.contains(MANIFEST_ENTRY) {
            MANIFEST_ENTRY.to_owned()
        } else {
            match self
                .entry_names()
                .find(|n| n.eq_ignore_ascii_case(MANIFEST_ENTRY))
            {
                Some(name) => name.to_owned(),
                None => return Ok(None),
            }
        };

        let Some(bytes) = self.read_metadata_entry(&entry_name)? else {
            return Ok(None);
        };

        // 잘못된 바이트는 U+FFFD로 대체하고 나머지 속성은 그대로 읽습니다.
        let content = String::from_utf8_lossy(&bytes);

        Ok(Some(Manifest::parse(&content)))
    }
}

impl std::fmt::Debug for JarArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JarArchive")
            .field("path", &self.display_path)
            .field("entries", &self.zip.len())
            .finish()
    }
}
