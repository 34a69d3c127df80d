use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{
    models::{AnalysisDetail, AnalysisRecord, NewAnalysis, WordFrequency},
    Database,
};

/// Persistence of analyses and their frequency tables.
///
/// Every method can fail with a storage error. `create` must be atomic: a
/// record is never visible without its frequencies, or the other way round.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Number of retained analyses.
    async fn count(&self) -> Result<u64>;

    /// Remove the analysis with the oldest `created_at` together with its
    /// frequencies. Does nothing when the store is empty.
    async fn delete_oldest(&self) -> Result<()>;

    async fn create(&self, analysis: NewAnalysis, frequencies: Vec<WordFrequency>) -> Result<Uuid>;

    /// Newest first.
    async fn find_all(&self) -> Result<Vec<AnalysisRecord>>;

    /// Frequencies come back ordered by rank.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisDetail>>;
}

#[async_trait]
impl HistoryStore for Database {
    async fn count(&self) -> Result<u64> {
        self.count_analyses().await
    }

    async fn delete_oldest(&self) -> Result<()> {
        self.delete_oldest_analysis().await.map(|_| ())
    }

    async fn create(&self, analysis: NewAnalysis, frequencies: Vec<WordFrequency>) -> Result<Uuid> {
        self.insert_analysis(analysis, frequencies)
            .await
            .map(|record| record.id)
    }

    async fn find_all(&self) -> Result<Vec<AnalysisRecord>> {
        self.list_analyses().await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisDetail>> {
        self.get_analysis(id).await
    }
}
