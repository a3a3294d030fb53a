use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

const MAX_FILE_STEM_CHARS: usize = 80;

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// A file stem safe on every common filesystem. Falls back to `"capture"`.
pub fn sanitize_file_stem(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            ch if ch.is_control() => ' ',
            ch => ch,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem: String = collapsed
        .trim_matches(|ch: char| ch == '.' || ch == '-' || ch.is_whitespace())
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();

    let stem = stem.trim_end().to_string();
    if stem.is_empty() {
        "capture".to_string()
    } else {
        stem
    }
}
