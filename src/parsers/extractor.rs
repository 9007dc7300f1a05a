//! Best-effort extraction of values from embedded `info.json` files.
//!
//! Two layers, tried in order by the callers:
//!
//! 1. [`extract_structured`] - a strict JSON parse into a [`Value`] tree.
//! 2. [`extract_field`] / [`extract_raw_value`] - anchored, case-insensitive pattern scraping of
//!    the raw text, used when the document is not valid JSON (trailing commas, unescaped quotes,
//!    duplicate keys and so on). Scraping never fails; a missing key is simply `None`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Mutex;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Maximum size of a metadata entry we are willing to decode: 10MB
pub const MAX_METADATA_BYTES: u64 = 10 * 1024 * 1024;

lazy_static::lazy_static! {
    /// Compiled scrape patterns, keyed by pattern text
    static ref PATTERNS: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{message}")]
    Parse { message: String },
    #[error("metadata too large ({size} bytes, max {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

/// Decode metadata bytes as UTF-8, replacing invalid sequences and dropping a leading BOM
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

/// Parse metadata bytes as a JSON document
pub fn extract_structured(bytes: &[u8]) -> Result<Value, ExtractionError> {
    if bytes.len() as u64 > MAX_METADATA_BYTES {
        return Err(ExtractionError::TooLarge { size: bytes.len() as u64, limit: MAX_METADATA_BYTES });
    }
    let text = decode_text(bytes);
    serde_json::from_str(&text).map_err(|e| ExtractionError::Parse { message: e.to_string() })
}

/// Scrape `"<key>": "<value>"` from raw text.
///
/// With `section`, the pair must sit inside the `"<section>": { ... }` body. Matching is
/// case-insensitive and whitespace/newline tolerant. Returns the first match.
pub fn extract_field(text: &str, key: &str, section: Option<&str>) -> Option<String> {
    let pattern = format!(r#"{}"{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, section_prefix(section), regex::escape(key));
    let re = build(&pattern)?;
    re.captures(text).and_then(|caps| caps.get(1)).map(|m| unescape(m.as_str()))
}

/// Scrape the raw value text for `key`: a quoted string (without quotes), a bracketed array
/// (with brackets) or a bare scalar such as a number.
///
/// Callers split or parse the result themselves, e.g. with [`split_list`].
pub fn extract_raw_value(text: &str, key: &str, section: Option<&str>) -> Option<String> {
    let pattern = format!(
        r#"{}"{}"\s*:\s*("(?:[^"\\]|\\.)*"|\[[^\]]*\]|[^,\}}\]\s]+)"#,
        section_prefix(section),
        regex::escape(key)
    );
    let re = build(&pattern)?;
    let raw = re.captures(text)?.get(1)?.as_str();
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => Some(unescape(inner)),
        None => Some(raw.to_string()),
    }
}

/// Keep only the outermost object's own text.
///
/// Bodies of nested `{ ... }` sections are dropped, so scraping a top-level key such as
/// `"Type"` cannot pick up the same key from inside `"Engine": { ... }`. Braces inside string
/// values are ignored.
pub fn top_level_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        let was_top = depth <= 1;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if was_top && depth <= 1 {
            out.push(c);
        }
    }
    out
}

/// Split a scraped list: `["a", "b"]`, `a, b` and `'a','b'` all give `["a", "b"]`
pub fn split_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(trimmed);
    body.split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Look up `key` in a JSON object, exact match first, then ignoring ASCII case
pub fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    object.get(key).or_else(|| {
        object.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    })
}

/// Render a scalar JSON value as display text; `null` and empty strings are `None`
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read a list that may be a JSON array or a comma-separated string
pub fn value_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(s) => split_list(s),
        Value::Null => Vec::new(),
        other => value_to_text(other).into_iter().collect(),
    }
}

fn section_prefix(section: Option<&str>) -> String {
    match section {
        Some(name) => format!(r#""{}"\s*:\s*\{{[^{{}}]*?"#, regex::escape(name)),
        None => String::new(),
    }
}

fn build(pattern: &str) -> Option<Regex> {
    let pattern = format!("(?is){}", pattern);
    if let Ok(patterns) = PATTERNS.lock() {
        if let Some(re) = patterns.get(&pattern) {
            return Some(re.clone());
        }
    }
    match Regex::new(&pattern) {
        Ok(re) => {
            if let Ok(mut patterns) = PATTERNS.lock() {
                patterns.insert(pattern, re.clone());
            }
            Some(re)
        }
        Err(e) => {
            tracing::warn!("Failed to build scrape pattern {}: {}", pattern, e);
            None
        }
    }
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
