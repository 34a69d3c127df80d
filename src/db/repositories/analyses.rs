use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use log::debug;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_uuid, to_i64, to_u32, to_u64},
    models::{AnalysisDetail, AnalysisRecord, NewAnalysis, WordFrequency},
};

fn row_to_analysis(row: &Row) -> Result<AnalysisRecord> {
    let id: String = row.get("id")?;
    let total_words: i64 = row.get("total_words")?;
    let created_at: String = row.get("created_at")?;

    Ok(AnalysisRecord {
        id: parse_uuid(&id, "id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        total_words: to_u64(total_words, "total_words")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn row_to_frequency(row: &Row) -> Result<WordFrequency> {
    let count: i64 = row.get("count")?;
    let rank: i64 = row.get("rank")?;

    Ok(WordFrequency {
        word: row.get("word")?,
        count: to_u64(count, "count")?,
        percentage: row.get("percentage")?,
        rank: to_u32(rank, "rank")?,
    })
}

impl Database {
    pub async fn count_analyses(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
            to_u64(count, "analysis count")
        })
        .await
    }

    /// Delete the analysis with the smallest `created_at` (insertion order
    /// breaks ties). Frequency rows go with it through the cascade.
    /// Returns the evicted id, or `None` when there was nothing to delete.
    pub async fn delete_oldest_analysis(&self) -> Result<Option<Uuid>> {
        self.execute(|conn| {
            let tx = conn.transaction()?;

            let oldest: Option<String> = tx
                .query_row(
                    "SELECT id FROM analyses ORDER BY created_at ASC, rowid ASC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(id) = oldest else {
                return Ok(None);
            };

            tx.execute("DELETE FROM analyses WHERE id = ?1", params![id])
                .with_context(|| format!("failed to delete analysis {id}"))?;
            tx.commit()?;

            parse_uuid(&id, "id").map(Some)
        })
        .await
    }

    /// Insert an analysis and all of its frequency rows in one transaction.
    pub async fn insert_analysis(
        &self,
        analysis: NewAnalysis,
        frequencies: Vec<WordFrequency>,
    ) -> Result<AnalysisRecord> {
        self.execute(move |conn| {
            let record = AnalysisRecord {
                id: Uuid::new_v4(),
                title: analysis.title,
                text: analysis.text,
                total_words: analysis.total_words,
                // Same precision `format_datetime` writes.
                created_at: Utc::now().trunc_subsecs(6),
            };
            let id = record.id.to_string();

            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO analyses (id, title, text, total_words, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    record.title,
                    record.text,
                    to_i64(record.total_words)?,
                    format_datetime(&record.created_at),
                ],
            )
            .context("failed to insert analysis")?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO word_frequencies (analysis_id, word, count, percentage, rank)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for frequency in &frequencies {
                    stmt.execute(params![
                        id,
                        frequency.word,
                        to_i64(frequency.count)?,
                        frequency.percentage,
                        frequency.rank,
                    ])
                    .with_context(|| format!("failed to insert frequency '{}'", frequency.word))?;
                }
            }

            tx.commit().context("failed to commit analysis")?;
            debug!("Stored analysis {id} with {} frequencies", frequencies.len());

            Ok(record)
        })
        .await
    }

    /// All analyses, newest first.
    pub async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, text, total_words, created_at
                 FROM analyses
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut analyses = Vec::new();
            while let Some(row) = rows.next()? {
                analyses.push(row_to_analysis(row)?);
            }

            Ok(analyses)
        })
        .await
    }

    pub async fn get_analysis(&self, analysis_id: Uuid) -> Result<Option<AnalysisDetail>> {
        self.execute(move |conn| {
            let id = analysis_id.to_string();

            let mut stmt = conn.prepare(
                "SELECT id, title, text, total_words, created_at
                 FROM analyses
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            let record = match rows.next()? {
                Some(row) => row_to_analysis(row)?,
                None => return Ok(None),
            };

            let mut stmt = conn.prepare(
                "SELECT word, count, percentage, rank
                 FROM word_frequencies
                 WHERE analysis_id = ?1
                 ORDER BY rank ASC",
            )?;
            let mut rows = stmt.query(params![id])?;
            let mut frequencies = Vec::new();
            while let Some(row) = rows.next()? {
                frequencies.push(row_to_frequency(row)?);
            }

            Ok(Some(AnalysisDetail {
                record,
                frequencies,
            }))
        })
        .await
    }
}
