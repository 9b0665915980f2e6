//! In-memory vector index
//!
//! Stores chunk embeddings with their metadata and answers nearest-neighbor
//! queries by brute-force scan. Dimension and distance metric are fixed at
//! construction and apply to every insert and query.
//!
//! State lives only in process memory: a restart loses the index, and
//! multiple gateway instances do not share it.

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Distance metric, fixed per index
///
/// `Cosine` is the default used by the gateway: distance = 1 - cosine
/// similarity, so 0.0 is identical direction and 2.0 is opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    // A zero vector has no direction; treat as orthogonal
                    return 1.0;
                }
                1.0 - dot / (norm_a * norm_b)
            }
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// A chunk with its embedding, ready for insertion
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A query hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f32,
}

struct Entry {
    record: IndexRecord,
    /// Monotonic insertion counter, used as the tie-break at query time
    order: u64,
}

struct Inner {
    entries: Vec<Entry>,
    next_order: u64,
}

/// In-memory vector index with concurrent inserts and queries
pub struct VectorIndex {
    dimensions: usize,
    metric: DistanceMetric,
    inner: RwLock<Inner>,
}

impl VectorIndex {
    /// Create an index for a fixed dimension and metric
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            dimensions,
            metric,
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                next_order: 0,
            }),
        }
    }

    /// Configured embedding dimension
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Configured distance metric
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check_dimensions(&self, record: &IndexRecord) -> Result<()> {
        if record.embedding.len() != self.dimensions {
            return Err(Error::index(format!(
                "embedding dimension {} does not match index dimension {} (chunk {})",
                record.embedding.len(),
                self.dimensions,
                record.chunk.id
            )));
        }
        Ok(())
    }

    /// Insert a record, replacing any existing entry with the same chunk id
    ///
    /// Fails only on dimension mismatch. Replacement keeps the original
    /// insertion position, so tie-break ordering is unaffected.
    pub fn insert(&self, record: IndexRecord) -> Result<()> {
        self.check_dimensions(&record)?;
        let mut inner = self.inner.write();
        if let Some(existing) = inner
            .entries
            .iter_mut()
            .find(|e| e.record.chunk.id == record.chunk.id)
        {
            existing.record = record;
            return Ok(());
        }
        let order = inner.next_order;
        inner.next_order += 1;
        inner.entries.push(Entry { record, order });
        Ok(())
    }

    /// Atomically replace all chunks of a source with a new batch
    ///
    /// Used at ingestion time so a document's chunks land as one unit and a
    /// concurrent query never sees a half-ingested revision.
    pub fn insert_batch(&self, source: &str, records: Vec<IndexRecord>) -> Result<()> {
        for record in &records {
            self.check_dimensions(record)?;
        }
        let mut inner = self.inner.write();
        inner.entries.retain(|e| e.record.chunk.source != source);
        for record in records {
            let order = inner.next_order;
            inner.next_order += 1;
            inner.entries.push(Entry { record, order });
        }
        Ok(())
    }

    /// Remove all chunks of a source, returning how many were dropped
    pub fn remove_source(&self, source: &str) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.record.chunk.source != source);
        before - inner.entries.len()
    }

    /// Return the `k` nearest chunks, ascending by distance
    ///
    /// Ties break by insertion order. Returns fewer than `k` hits when the
    /// index holds fewer chunks; an empty index yields an empty vec.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if embedding.len() != self.dimensions {
            return Err(Error::index(format!(
                "query dimension {} does not match index dimension {}",
                embedding.len(),
                self.dimensions
            )));
        }

        let inner = self.inner.read();
        let mut scored: Vec<(f32, u64, &IndexRecord)> = inner
            .entries
            .iter()
            .map(|e| {
                (
                    self.metric.distance(embedding, &e.record.embedding),
                    e.order,
                    &e.record,
                )
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, _, record)| SearchHit {
                chunk: record.chunk.clone(),
                distance,
            })
            .collect())
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id_seq: usize, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            chunk: Chunk::new("doc.txt", "rev0", id_seq, format!("chunk {}", id_seq)),
            embedding,
        }
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let index = VectorIndex::new(3, DistanceMetric::Cosine);
        assert!(index.insert(record(0, vec![1.0, 0.0, 0.0])).is_ok());
        assert!(index.insert(record(1, vec![1.0, 0.0])).is_err());
        assert!(index.query(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn empty_index_returns_empty_not_error() {
        let index = VectorIndex::new(2, DistanceMetric::Cosine);
        let hits = index.query(&[1.0, 0.0], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn returns_stored_count_when_fewer_than_k() {
        let index = VectorIndex::new(2, DistanceMetric::Euclidean);
        index.insert(record(0, vec![0.0, 0.0])).unwrap();
        index.insert(record(1, vec![1.0, 1.0])).unwrap();
        let hits = index.query(&[0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn sorts_ascending_with_insertion_order_ties() {
        let index = VectorIndex::new(2, DistanceMetric::Euclidean);
        // Two entries at identical distance from the query, one nearer
        index.insert(record(0, vec![2.0, 0.0])).unwrap();
        index.insert(record(1, vec![0.0, 2.0])).unwrap();
        index.insert(record(2, vec![0.5, 0.0])).unwrap();

        let hits = index.query(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].chunk.seq, 2);
        // Equal distances keep insertion order
        assert_eq!(hits[1].chunk.seq, 0);
        assert_eq!(hits[2].chunk.seq, 1);
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn insert_replaces_by_chunk_id() {
        let index = VectorIndex::new(2, DistanceMetric::Euclidean);
        index.insert(record(0, vec![1.0, 0.0])).unwrap();
        let mut updated = record(0, vec![0.0, 1.0]);
        updated.chunk.text = "updated".to_string();
        index.insert(updated).unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.query(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].chunk.text, "updated");
    }

    #[test]
    fn batch_replaces_prior_source_chunks() {
        let index = VectorIndex::new(2, DistanceMetric::Euclidean);
        index
            .insert_batch(
                "doc.txt",
                vec![record(0, vec![1.0, 0.0]), record(1, vec![0.0, 1.0])],
            )
            .unwrap();
        assert_eq!(index.len(), 2);

        // Shorter re-ingestion leaves no stale trailing chunks
        index
            .insert_batch("doc.txt", vec![record(0, vec![0.5, 0.5])])
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_source_drops_only_that_source() {
        let index = VectorIndex::new(2, DistanceMetric::Euclidean);
        index.insert(record(0, vec![1.0, 0.0])).unwrap();
        let other = IndexRecord {
            chunk: Chunk::new("other.txt", "rev1", 0, "other"),
            embedding: vec![0.0, 1.0],
        };
        index.insert(other).unwrap();

        assert_eq!(index.remove_source("doc.txt"), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn cosine_distance_of_zero_vector_is_orthogonal() {
        let metric = DistanceMetric::Cosine;
        assert_eq!(metric.distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
