//! Analysis history data models.
//!
//! - `AnalysisRecord`: one stored analysis (the history row).
//! - `WordFrequency`: one ranked word owned by an analysis.
//! - `AnalysisDetail`: a record together with its frequency table.
//! - `AnalysisSummary`: the list-view projection with a text preview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of the original text shown in list views.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub title: Option<String>,
    pub text: String,
    pub total_words: u64,
    pub created_at: DateTime<Utc>,
}

/// A ranked word. `percentage` is kept as text fixed to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordFrequency {
    pub word: String,
    pub count: u64,
    pub percentage: String,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetail {
    #[serde(flatten)]
    pub record: AnalysisRecord,
    pub frequencies: Vec<WordFrequency>,
}

/// Input for inserting an analysis; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub title: Option<String>,
    pub text: String,
    pub total_words: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub text_preview: String,
    pub total_words: u64,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRecord> for AnalysisSummary {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            text_preview: record.text.chars().take(PREVIEW_CHARS).collect(),
            total_words: record.total_words,
            created_at: record.created_at,
        }
    }
}
