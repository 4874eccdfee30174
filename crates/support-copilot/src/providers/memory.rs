//! Process-local vector index
//!
//! Exhaustive cosine search over a map of records. Used for the `memory`
//! backend and by tests; contents are lost on restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::IndexRecord;

use super::vector_index::{IndexMatch, IndexStats, VectorIndexProvider};

/// In-memory vector index with cosine similarity
pub struct InMemoryVectorIndex {
    records: RwLock<HashMap<String, IndexRecord>>,
    dimensions: usize,
}

impl InMemoryVectorIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            dimensions,
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Remove every record
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Ids of all stored records, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Cosine similarity of two equal-length vectors; 0.0 when either is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[async_trait]
impl VectorIndexProvider for InMemoryVectorIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.dimensions) {
            return Err(Error::invalid(format!(
                "record {} has dimension {}, index expects {}",
                bad.id,
                bad.vector.len(),
                self.dimensions
            )));
        }

        let mut map = self.records.write();
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        if vector.len() != self.dimensions {
            return Err(Error::invalid(format!(
                "query has dimension {}, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        let map = self.records.read();
        let mut matches: Vec<IndexMatch> = map
            .values()
            .map(|r| IndexMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.vector),
                metadata: Some(r.metadata.clone()),
            })
            .collect();

        // Ties broken by id so results are stable
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            total_vector_count: self.len() as u64,
            dimension: Some(self.dimensions),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordMetadata;

    fn record(id: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            vector,
            metadata: RecordMetadata {
                text: format!("text for {}", id),
                source: "kb.txt".to_string(),
                sequence_index: 0,
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_score() {
        let index = InMemoryVectorIndex::new(2);
        index
            .upsert(&[
                record("far", vec![0.0, 1.0]),
                record("near", vec![1.0, 0.1]),
                record("mid", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "near");
        assert_eq!(matches[1].id, "mid");
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id_and_rejects_bad_dimension() {
        let index = InMemoryVectorIndex::new(2);
        index.upsert(&[record("a", vec![1.0, 0.0])]).await.unwrap();
        index.upsert(&[record("a", vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(index.len(), 1);

        let err = index.upsert(&[record("b", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert_eq!(index.stats().await.unwrap().total_vector_count, 1);
    }
}
