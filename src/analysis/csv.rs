use std::borrow::Cow;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::db::models::{AnalysisDetail, WordFrequency};

const BOM: char = '\u{feff}';

pub const FREQUENCY_HEADERS: [&str; 4] = ["順位", "単語", "出現回数", "出現率(%)"];

/// Filename stem used when an analysis has no title.
pub const DEFAULT_EXPORT_NAME: &str = "分析結果";

/// Everything outside RFC 5987 `attr-char` gets escaped.
const FILENAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for CsvValue {
    fn from(value: &str) -> Self {
        CsvValue::Text(value.to_string())
    }
}

impl From<String> for CsvValue {
    fn from(value: String) -> Self {
        CsvValue::Text(value)
    }
}

impl From<u64> for CsvValue {
    fn from(value: u64) -> Self {
        // Counts never approach i64::MAX; saturate rather than wrap.
        CsvValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for CsvValue {
    fn from(value: u32) -> Self {
        CsvValue::Integer(i64::from(value))
    }
}

impl<T: Into<CsvValue>> From<Option<T>> for CsvValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CsvValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

/// Render a BOM-prefixed CSV document. Rows are joined with `\n` and the
/// output carries no trailing newline.
pub fn to_csv(headers: &[&str], rows: &[Vec<CsvValue>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|header| escape_field(header))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(row.iter().map(render_value).collect::<Vec<_>>().join(","));
    }

    let mut output = String::new();
    output.push(BOM);
    output.push_str(&lines.join("\n"));
    output
}

fn render_value(value: &CsvValue) -> String {
    match value {
        CsvValue::Text(text) => escape_field(text).into_owned(),
        CsvValue::Integer(number) => number.to_string(),
        CsvValue::Null => String::new(),
    }
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn frequency_rows(frequencies: &[WordFrequency]) -> Vec<Vec<CsvValue>> {
    frequencies
        .iter()
        .map(|frequency| {
            vec![
                frequency.rank.into(),
                frequency.word.as_str().into(),
                frequency.count.into(),
                frequency.percentage.as_str().into(),
            ]
        })
        .collect()
}

/// `<title or default>_<YYYYMMDDHHMMSS>.csv` with quotes, slashes and
/// control characters replaced. Still UTF-8; see [`content_disposition`].
pub fn export_filename(title: Option<&str>, created_at: DateTime<Utc>) -> String {
    let stem = title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_EXPORT_NAME);
    let stem: String = stem
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("{stem}_{}.csv", created_at.format("%Y%m%d%H%M%S"))
}

/// ASCII-only `Content-Disposition` for a download. The name is
/// percent-encoded in both `filename` and the RFC 5987 `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let encoded = utf8_percent_encode(filename, FILENAME_ESCAPES).to_string();
    format!("attachment; filename=\"{encoded}\"; filename*=UTF-8''{encoded}")
}

pub fn export_analysis(detail: &AnalysisDetail) -> CsvExport {
    CsvExport {
        filename: export_filename(detail.record.title.as_deref(), detail.record.created_at),
        body: to_csv(&FREQUENCY_HEADERS, &frequency_rows(&detail.frequencies)),
    }
}
