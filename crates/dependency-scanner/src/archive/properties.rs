//! Java `.properties` 파서
//!
//! Maven이 JAR에 넣는 `pom.properties`를 읽기 위한 최소 구현입니다.
//!
//! # 지원 문법
//!
//! - `#`, `!`로 시작하는 주석 줄
//! - 구분자: `=`, `:`, 또는 공백
//! - 줄바꿈: LF, CRLF, CR
//! - 줄 끝 `\`로 이어지는 행 (다음 줄 앞 공백 제거)
//! - 이스케이프: `\t`, `\n`, `\r`, `\f`, `\uXXXX`, 그 외 `\x` → `x`

use std::collections::HashMap;

use super::manifest::split_lines;

/// 파싱된 속성 목록
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// 텍스트를 파싱합니다. 같은 키가 여러 번 나오면 마지막 값이 남습니다.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for logical in logical_lines(content) {
            let (key, value) = split_key_value(&logical);
            entries.insert(unescape(key), unescape(value));
        }

        Self { entries }
    }

    /// 키에 해당하는 값을 반환합니다 (대소문자 구분).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 주석과 빈 줄을 제거하고 연속 행을 합친 논리 행 목록
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in split_lines(content) {
        let line = raw.trim_start_matches([' ', '\t', '\u{c}']);

        let line = match current.take() {
            Some(mut pending) => {
                pending.push_str(line);
                pending
            }
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                line.to_owned()
            }
        };

        if ends_with_continuation(&line) {
            let mut pending = line;
            pending.pop();
            current = Some(pending);
        } else {
            lines.push(line);
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }

    lines
}

/// 줄 끝의 `\` 개수가 홀수이면 다음 줄로 이어집니다.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    let rest = match rest.strip_prefix(['=', ':']) {
        Some(after) => after.trim_start_matches([' ', '\t', '\u{c}']),
        None => rest,
    };

    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
