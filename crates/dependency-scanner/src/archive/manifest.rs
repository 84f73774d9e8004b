//! `META-INF/MANIFEST.MF` 파서
//!
//! 메인 섹션(첫 빈 줄 이전)의 속성만 읽습니다. 속성 이름은 대소문자를
//! 구분하지 않으며, 공백 한 칸으로 시작하는 줄은 이전 값의 연속입니다.

use std::collections::HashMap;

/// 파싱된 manifest 메인 섹션
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: HashMap<String, String>,
}

impl Manifest {
    /// manifest 텍스트를 파싱합니다.
    ///
    /// 이름/값 구분자(`": "`)가 없는 줄은 무시합니다.
    pub fn parse(content: &str) -> Self {
        let mut main = HashMap::new();
        let mut current: Option<(String, String)> = None;

        for line in split_lines(content) {
            if line.is_empty() {
                break;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(continuation);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                main.insert(name, value);
            }

            current = line
                .split_once(':')
                .map(|(name, value)| {
                    let value = value.strip_prefix(' ').unwrap_or(value);
                    (name.trim().to_ascii_lowercase(), value.to_owned())
                })
                .filter(|(name, _)| !name.is_empty());
        }

        if let Some((name, value)) = current {
            main.insert(name, value);
        }

        Self { main }
    }

    /// 메인 섹션 속성 값을 반환합니다 (이름 대소문자 무시).
    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        self.main
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }
}

/// CRLF, LF, CR 줄바꿈을 모두 처리합니다.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        lines.push(&content[start..]);
    }

    lines
}
