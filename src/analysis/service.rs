use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::models::{AnalysisDetail, AnalysisSummary, NewAnalysis};
use crate::{log_info, log_warn};

use super::{
    csv::{export_analysis, CsvExport},
    store::HistoryStore,
    tokenizer::analyze_text,
};

const ENABLE_LOGS: bool = true;

/// Maximum number of analyses kept in history.
pub const HISTORY_LIMIT: u64 = 10;

/// Validated request to analyze a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAnalysisInput {
    pub title: Option<String>,
    pub text: String,
}

/// Runs analyses against a [`HistoryStore`] and enforces the history cap.
pub struct AnalysisService {
    store: Arc<dyn HistoryStore>,
    // Held across count/evict/insert so concurrent writers cannot overshoot the cap.
    write_lock: Mutex<()>,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Analyze `input.text` and store the result, evicting the oldest
    /// analysis first if the history is full.
    ///
    /// An eviction is not undone if the following insert fails.
    pub async fn analyze(&self, input: CreateAnalysisInput) -> Result<Uuid> {
        let _writer = self.write_lock.lock().await;

        let retained = self.store.count().await?;
        if retained >= HISTORY_LIMIT {
            log_info!("History holds {retained} analyses; evicting the oldest");
            self.store.delete_oldest().await?;
        }

        let text = input.text.trim().to_string();
        let analysis = analyze_text(&text);
        let title = input
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());

        let record = NewAnalysis {
            title,
            text,
            total_words: analysis.total_words,
        };
        let id = match self.store.create(record, analysis.ranked()).await {
            Ok(id) => id,
            Err(err) => {
                log_warn!("Failed to store analysis: {err:#}");
                return Err(err);
            }
        };

        log_info!(
            "Stored analysis {id} ({} words, {} distinct kept)",
            analysis.total_words,
            analysis.frequencies.len()
        );
        Ok(id)
    }

    pub async fn list(&self) -> Result<Vec<AnalysisSummary>> {
        let records = self.store.find_all().await?;
        Ok(records.into_iter().map(AnalysisSummary::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AnalysisDetail>> {
        self.store.find_by_id(id).await
    }

    pub async fn export_csv(&self, id: Uuid) -> Result<Option<CsvExport>> {
        let detail = self.store.find_by_id(id).await?;
        Ok(detail.as_ref().map(export_analysis))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex as StdMutex,
    };

    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::{
        models::{AnalysisRecord, WordFrequency},
        Database,
    };

    /// In-memory store; `created_at` advances one second per insert.
    #[derive(Default)]
    struct MemoryStore {
        rows: StdMutex<Vec<AnalysisDetail>>,
        fail_create: AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for MemoryStore {
        async fn count(&self) -> Result<u64> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }

        async fn delete_oldest(&self) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(position) = rows
                .iter()
                .enumerate()
                .min_by_key(|(_, detail)| detail.record.created_at)
                .map(|(position, _)| position)
            {
                rows.remove(position);
            }
            Ok(())
        }

        async fn create(
            &self,
            analysis: NewAnalysis,
            frequencies: Vec<WordFrequency>,
        ) -> Result<Uuid> {
            if self.fail_create.load(Ordering::SeqCst) {
                bail!("disk full");
            }
            let mut rows = self.rows.lock().unwrap();
            let record = AnalysisRecord {
                id: Uuid::new_v4(),
                title: analysis.title,
                text: analysis.text,
                total_words: analysis.total_words,
                created_at: Utc::now() + Duration::seconds(rows.len() as i64 + 1),
            };
            let id = record.id;
            rows.push(AnalysisDetail {
                record,
                frequencies,
            });
            Ok(id)
        }

        async fn find_all(&self) -> Result<Vec<AnalysisRecord>> {
            let mut records: Vec<AnalysisRecord> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .map(|detail| detail.record.clone())
                .collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisDetail>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|detail| detail.record.id == id)
                .cloned())
        }
    }

    fn input(title: Option<&str>, text: &str) -> CreateAnalysisInput {
        CreateAnalysisInput {
            title: title.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_normalizes_and_ranks() {
        let service = AnalysisService::new(Arc::new(MemoryStore::default()));

        let id = service
            .analyze(input(
                Some("   "),
                "  The quick brown fox jumps over the lazy dog \n",
            ))
            .await
            .unwrap();
        let detail = service.get(id).await.unwrap().expect("stored");

        assert_eq!(detail.record.title, None);
        assert_eq!(
            detail.record.text,
            "The quick brown fox jumps over the lazy dog"
        );
        assert_eq!(detail.record.total_words, 9);
        assert_eq!(detail.frequencies.len(), 8);
        assert_eq!(detail.frequencies[0].word, "the");
        assert_eq!(detail.frequencies[0].rank, 1);

        let titled = service
            .analyze(input(Some("  Fox  "), "fox"))
            .await
            .unwrap();
        let detail = service.get(titled).await.unwrap().unwrap();
        assert_eq!(detail.record.title.as_deref(), Some("Fox"));
    }

    #[tokio::test]
    async fn test_empty_text_is_stored_with_no_frequencies() {
        let service = AnalysisService::new(Arc::new(MemoryStore::default()));
        let id = service.analyze(input(None, "")).await.unwrap();

        let detail = service.get(id).await.unwrap().unwrap();
        assert_eq!(detail.record.total_words, 0);
        assert!(detail.frequencies.is_empty());
    }

    #[tokio::test]
    async fn test_eleventh_analysis_evicts_oldest() {
        let service = AnalysisService::new(Arc::new(MemoryStore::default()));

        let mut ids = Vec::new();
        for n in 0..HISTORY_LIMIT {
            let title = format!("t{n}");
            ids.push(
                service
                    .analyze(input(Some(title.as_str()), "alpha beta"))
                    .await
                    .unwrap(),
            );
        }
        let newest = service.analyze(input(None, "gamma")).await.unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len() as u64, HISTORY_LIMIT);
        assert_eq!(listed[0].id, newest);
        assert!(listed.iter().all(|summary| summary.id != ids[0]));
        assert!(service.get(ids[0]).await.unwrap().is_none());
        assert!(listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_failed_insert_after_eviction_is_not_rolled_back() {
        let store = Arc::new(MemoryStore::default());
        let service = AnalysisService::new(store.clone());
        for _ in 0..HISTORY_LIMIT {
            service.analyze(input(None, "word")).await.unwrap();
        }

        store.fail_create.store(true, Ordering::SeqCst);
        assert!(service.analyze(input(None, "word")).await.is_err());
        assert_eq!(store.count().await.unwrap(), HISTORY_LIMIT - 1);
    }

    #[tokio::test]
    async fn test_export_csv_for_missing_analysis() {
        let service = AnalysisService::new(Arc::new(MemoryStore::default()));
        assert!(service.export_csv(Uuid::new_v4()).await.unwrap().is_none());

        let id = service.analyze(input(Some("cats"), "cat cat dog")).await.unwrap();
        let export = service.export_csv(id).await.unwrap().unwrap();
        assert!(export.filename.starts_with("cats_"));
        assert!(export.body.ends_with("1,cat,2,66.67\n2,dog,1,33.33"));
    }

    #[tokio::test]
    async fn test_concurrent_writers_respect_history_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("service_test.sqlite3")).expect("open db");
        let service = Arc::new(AnalysisService::new(Arc::new(db.clone())));

        let mut handles = Vec::new();
        for n in 0..25 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .analyze(input(None, &format!("writer number {n}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("analyze");
        }

        assert_eq!(db.count_analyses().await.unwrap(), HISTORY_LIMIT);
        assert_eq!(service.list().await.unwrap().len() as u64, HISTORY_LIMIT);
    }
}
