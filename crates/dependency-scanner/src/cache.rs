//! 관측된 아카이브 경로 캐시
//!
//! [`PathCache`]는 프로세스 수명 동안 관측된 JAR 경로를 기억합니다.
//! 용량에 도달하면 새 경로는 조용히 버려지며, 경로는 [`PathCache::forget`]으로만 제거됩니다.
//! 영속화하지 않습니다.

use std::collections::BTreeSet;

/// 기본 캐시 용량
pub const DEFAULT_CAPACITY: usize = 1000;

/// 관측 경로로 받아들이는 접미사
const ACCEPTED_SUFFIXES: [&str; 5] = [".jar", ".jar!", ".jar!/", ".jar/", ".jar!\\"];

/// 용량 제한이 있는 정렬된 경로 집합
#[derive(Debug, Clone)]
pub struct PathCache {
    paths: BTreeSet<String>,
    capacity: usize,
}

impl PathCache {
    /// 지정한 용량으로 빈 캐시를 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            paths: BTreeSet::new(),
            capacity,
        }
    }

    /// 경로를 추가합니다.
    ///
    /// 새로 추가되었으면 `true`, 이미 있거나 용량이 가득 찼으면 `false`입니다.
    pub fn observe(&mut self, path: impl Into<String>) -> bool {
        if self.paths.len() >= self.capacity {
            return false;
        }
        self.paths.insert(path.into())
    }

    /// 경로를 제거합니다. 있었으면 `true`입니다.
    pub fn forget(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// 정렬된 순서로 순회합니다. 호출할 때마다 처음부터 다시 시작합니다.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// 현재 경로 목록의 복사본. 순회 중 `forget`이 필요할 때 사용합니다.
    pub fn snapshot(&self) -> Vec<String> {
        self.paths.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.paths.len() >= self.capacity
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// 클래스의 code-source 위치를 캐시 경로로 정규화합니다.
///
/// 1. 퍼센트 인코딩(`%20` 등)을 디코딩합니다.
/// 2. `jar:`, `file:`, `nested:` 같은 URL 스킴과 `//` authority를 제거합니다.
/// 3. `.jar`, `.jar!`, `.jar!/`, `.jar/`, `.jar!\`로 끝나지 않으면 `None`입니다.
/// 4. `.jar`로 끝나지 않으면 첫 `/`(없으면 `\`)부터 마지막 `.jar`까지 잘라냅니다.
pub fn normalize_location(location: &str) -> Option<String> {
    let decoded = urlencoding::decode(location)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| location.to_owned());

    let path = strip_url_prefix(&decoded);
    if path.is_empty() || !ACCEPTED_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        return None;
    }

    if path.ends_with(".jar") {
        return Some(path.to_owned());
    }

    let end = path.rfind(".jar")? + ".jar".len();
    let start = path.find('/').or_else(|| path.find('\\')).unwrap_or(0);
    if start >= end {
        return None;
    }

    Some(path[start..end].to_owned())
}

/// 스킴(`jar:file:` 처럼 중첩 가능)과 `//host` authority를 제거합니다.
///
/// 한 글자 스킴은 Windows 드라이브 문자(`C:`)로 보고 남겨둡니다.
fn strip_url_prefix(mut s: &str) -> &str {
    while let Some(rest) = strip_scheme(s) {
        s = rest;
    }

    if let Some(after) = s.strip_prefix("//") {
        s = match after.find('/') {
            Some(i) => &after[i..],
            None => "",
        };
    }

    s
}

fn strip_scheme(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    let valid = scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| &s[colon + 1..])
}
