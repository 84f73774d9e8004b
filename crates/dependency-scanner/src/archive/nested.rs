//! 중첩 아카이브 -- `outer.jar!/BOOT-INF/lib/inner.jar` 경로 처리
//!
//! fat-jar(Spring Boot 등)는 라이브러리 JAR을 외부 JAR 안에 그대로 담습니다.
//! 내부 엔트리는 고유한 이름의 임시 파일로 복사된 뒤 일반 아카이브처럼 열립니다.
//! 임시 파일은 [`NamedTempFile`]이 drop될 때 삭제됩니다.

use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::JarArchive;
use crate::error::DependencyScannerError;

/// 관측 경로를 외부 아카이브와 내부 엔트리로 나눈 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedPath {
    /// 파일 시스템상의 외부 아카이브 경로 (`.jar`로 끝남)
    pub outer: String,
    /// 외부 아카이브 안의 엔트리 이름. 없으면 일반 아카이브입니다.
    pub inner: Option<String>,
}

impl NestedPath {
    pub fn is_nested(&self) -> bool {
        self.inner.is_some()
    }
}

const JAR_EXT: &str = ".jar";

fn is_marker_char(c: char) -> bool {
    matches!(c, '!' | '/' | '\\')
}

/// 관측 경로를 외부/내부로 분리합니다.
///
/// 구분 마커는 첫 번째 `.jar!`이며, 없으면 첫 번째 `.jar/` 또는 `.jar\`입니다.
/// `.jar` 바로 뒤의 `!`, `/`, `\`는 모두 소비되고, 남은 부분이 비어 있으면
/// 내부 엔트리가 없는 것으로 봅니다. 마커가 경로 맨 앞에 있으면 분리하지 않습니다.
///
/// 중첩은 한 단계만 해석합니다. `a.jar!/b.jar!/c.jar`의 내부 엔트리는
/// `b.jar!/c.jar`가 되어 외부 아카이브에서 찾을 수 없게 됩니다.
pub fn split_nested(path: &str) -> NestedPath {
    let marker = path.find(".jar!").or_else(|| {
        match (path.find(".jar/"), path.find(".jar\\")) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    });

    let Some(idx) = marker.filter(|&i| i > 0) else {
        return NestedPath {
            outer: path.to_owned(),
            inner: None,
        };
    };

    let split_at = idx + JAR_EXT.len();
    let inner = path[split_at..]
        .trim_start_matches(is_marker_char)
        .trim_end_matches(is_marker_char);

    NestedPath {
        outer: path[..split_at].to_owned(),
        inner: (!inner.is_empty()).then(|| inner.to_owned()),
    }
}

/// 중첩 아카이브 추출 제한
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// 내부 엔트리 최대 크기 (바이트)
    pub max_size: u64,
    /// 복사 버퍼 크기 (바이트)
    pub buffer_size: usize,
}

/// 외부 아카이브의 `entry`를 `scratch_dir` 안의 임시 파일로 복사합니다.
///
/// 반환된 임시 파일은 drop 시 삭제됩니다.
///
/// # Errors
///
/// - 엔트리가 없거나 디렉토리이면 `NestedEntryNotFound`
/// - 크기가 `limits.max_size`를 넘으면 `NestedArchiveTooLarge`
/// - 임시 파일 생성/쓰기 실패 시 `Scratch`
pub fn extract_entry(
    outer: &mut JarArchive,
    entry: &str,
    scratch_dir: &Path,
    limits: ExtractLimits,
) -> Result<NamedTempFile, DependencyScannerError> {
    let outer_path = outer.display_path().to_owned();

    let mut scratch = tempfile::Builder::new()
        .prefix("depwatch-nested-")
        .suffix(JAR_EXT)
        .tempfile_in(scratch_dir)
        .map_err(|e| DependencyScannerError::Scratch {
            reason: format!("create in {}: {e}", scratch_dir.display()),
        })?;

    let copied = outer.with_entry(entry, |reader| {
        let mut writer = BufWriter::with_capacity(limits.buffer_size, scratch.as_file_mut());
        let copied = bounded_copy(reader, &mut writer, limits, &outer_path, entry)?;
        writer.flush().map_err(|e| DependencyScannerError::Scratch {
            reason: e.to_string(),
        })?;
        Ok(copied)
    })?;

    let Some(copied) = copied else {
        return Err(DependencyScannerError::NestedEntryNotFound {
            path: outer_path,
            entry: entry.to_owned(),
        });
    };

    tracing::debug!(
        outer = %outer_path,
        entry = %entry,
        bytes = copied,
        scratch = %scratch.path().display(),
        "nested archive extracted"
    );

    Ok(scratch)
}

fn bounded_copy(
    reader: &mut dyn Read,
    writer: &mut impl Write,
    limits: ExtractLimits,
    outer_path: &str,
    entry: &str,
) -> Result<u64, DependencyScannerError> {
    let mut buf = vec![0u8; limits.buffer_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(DependencyScannerError::InvalidArchive {
                    path: outer_path.to_owned(),
                    reason: format!("{entry}: {e}"),
                });
            }
        };

        total = total.saturating_add(n as u64);
        if total > limits.max_size {
            return Err(DependencyScannerError::NestedArchiveTooLarge {
                path: outer_path.to_owned(),
                entry: entry.to_owned(),
                max: limits.max_size,
            });
        }

        writer
            .write_all(&buf[..n])
            .map_err(|e| DependencyScannerError::Scratch {
                reason: e.to_string(),
            })?;
    }

    Ok(total)
}
