//! In-memory fragment index.
//!
//! Stores fragments in a Vec behind an async RwLock. Keyword search scores
//! by query occurrence normalized by content length; fragments that carry
//! embeddings can also be ranked by cosine similarity.

use crate::vector::cosine_similarity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragkit_core::error::{IndexError, Result, SearchError};
use ragkit_core::search::{SearchHit, SearchProvider, SearchRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A fragment stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedFragment {
    /// Unique fragment ID; assigned on insert when empty.
    pub id: String,

    /// The fragment text.
    pub content: String,

    /// Logical source location.
    pub file_path: String,

    /// 1-based inclusive line range within the source.
    pub start_line: u32,
    pub end_line: u32,

    /// Parent document ID when the fragment was produced by chunking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_document_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,

    /// Optional embedding vector for similarity search.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,

    /// When this fragment was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedFragment {
    /// Surface this fragment as a raw search hit with the given score.
    ///
    /// Source-location fields go into the metadata map under the keys the
    /// retrieval orchestrator reads.
    fn to_hit(&self, score: f32) -> SearchHit {
        let mut metadata = Map::new();
        metadata.insert("file_path".into(), Value::from(self.file_path.clone()));
        metadata.insert("start_line".into(), Value::from(self.start_line));
        metadata.insert("end_line".into(), Value::from(self.end_line));
        if let Some(doc_id) = &self.original_document_id {
            metadata.insert("original_document_id".into(), Value::from(doc_id.clone()));
        }
        if let Some(index) = self.chunk_index {
            metadata.insert("chunk_index".into(), Value::from(index));
        }
        if let Some(total) = self.total_chunks {
            metadata.insert("total_chunks".into(), Value::from(total));
        }

        SearchHit {
            id: self.id.clone(),
            content: self.content.clone(),
            score,
            metadata,
        }
    }
}

/// An in-memory index that stores fragments in a Vec.
///
/// Useful for testing and sessions where no external vector database is
/// available.
pub struct InMemoryIndex {
    fragments: Arc<RwLock<Vec<IndexedFragment>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            fragments: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Insert a fragment, assigning an ID when none was given.
    ///
    /// An embedded fragment must match the dimension the index already
    /// holds; mixed dimensions would make every similarity zero.
    pub async fn insert(&self, mut fragment: IndexedFragment) -> Result<String> {
        let mut fragments = self.fragments.write().await;
        if let Some(embedding) = &fragment.embedding {
            if let Some(expected) = embedded_dimension(&fragments) {
                if embedding.len() != expected {
                    return Err(IndexError::EmbeddingDimension {
                        expected,
                        got: embedding.len(),
                    }
                    .into());
                }
            }
        }
        if fragment.id.is_empty() {
            fragment.id = Uuid::new_v4().to_string();
        }
        let id = fragment.id.clone();
        fragments.push(fragment);
        Ok(id)
    }

    /// Get a fragment by ID.
    pub async fn get(&self, id: &str) -> Option<IndexedFragment> {
        let fragments = self.fragments.read().await;
        fragments.iter().find(|f| f.id == id).cloned()
    }

    /// Remove a fragment by ID. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut fragments = self.fragments.write().await;
        let len_before = fragments.len();
        fragments.retain(|f| f.id != id);
        fragments.len() < len_before
    }

    /// Total fragment count.
    pub async fn count(&self) -> usize {
        self.fragments.read().await.len()
    }

    /// Remove all fragments.
    pub async fn clear(&self) {
        self.fragments.write().await.clear();
    }

    /// Rank embedded fragments by cosine similarity to a query embedding.
    ///
    /// Fragments without embeddings are skipped. Results are sorted by
    /// descending similarity and capped at `top_k`. The query embedding
    /// must match the dimension of the stored embeddings.
    pub async fn search_by_embedding(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> std::result::Result<Vec<SearchHit>, IndexError> {
        let fragments = self.fragments.read().await;
        if query_embedding.is_empty() {
            return Err(IndexError::EmbeddingDimension {
                expected: embedded_dimension(&fragments).unwrap_or(0),
                got: 0,
            });
        }
        if let Some(expected) = embedded_dimension(&fragments) {
            if query_embedding.len() != expected {
                return Err(IndexError::EmbeddingDimension {
                    expected,
                    got: query_embedding.len(),
                });
            }
        }

        let mut scored: Vec<(f32, &IndexedFragment)> = fragments
            .iter()
            .filter_map(|fragment| {
                let embedding = fragment.embedding.as_ref()?;
                let sim = cosine_similarity(embedding, query_embedding);
                (sim >= min_score).then_some((sim, fragment))
            })
            .collect();

        Ok(rank_and_cap(&mut scored, top_k))
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        query: &str,
        request: &SearchRequest,
    ) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let fragments = self.fragments.read().await;
        let mut scored: Vec<(f32, &IndexedFragment)> = fragments
            .iter()
            .filter_map(|fragment| {
                // Keyword relevance: occurrences normalized by content length.
                let occurrences = fragment.content.to_lowercase().matches(&needle).count();
                if occurrences == 0 {
                    return None;
                }
                let score =
                    occurrences as f32 / (fragment.content.len() as f32 / 100.0).max(1.0);
                (score >= request.threshold).then_some((score, fragment))
            })
            .collect();

        let hits = rank_and_cap(&mut scored, request.top_k);
        debug!(query, hits = hits.len(), "in-memory keyword search");
        Ok(hits)
    }
}

/// Dimension of the stored embeddings, from the first embedded fragment.
fn embedded_dimension(fragments: &[IndexedFragment]) -> Option<usize> {
    fragments
        .iter()
        .find_map(|f| f.embedding.as_ref().map(Vec::len))
}

/// Sort scored fragments descending, cap at `limit`, surface as hits.
fn rank_and_cap(scored: &mut Vec<(f32, &IndexedFragment)>, limit: usize) -> Vec<SearchHit> {
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .iter()
        .take(limit)
        .map(|(score, fragment)| fragment.to_hit(*score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(content: &str, file_path: &str) -> IndexedFragment {
        IndexedFragment {
            id: String::new(),
            content: content.into(),
            file_path: file_path.into(),
            start_line: 1,
            end_line: 10,
            original_document_id: None,
            chunk_index: None,
            total_chunks: None,
            embedding: None,
            indexed_at: Utc::now(),
        }
    }

    fn embedded(content: &str, embedding: Vec<f32>) -> IndexedFragment {
        IndexedFragment {
            embedding: Some(embedding),
            ..fragment(content, "embedded.rs")
        }
    }

    fn request(top_k: usize, threshold: f32) -> SearchRequest {
        SearchRequest { top_k, threshold }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_get_retrieves() {
        let index = InMemoryIndex::new();
        let id = index
            .insert(fragment("fn parse(input: &str)", "src/parser.rs"))
            .await
            .unwrap();
        assert!(!id.is_empty());

        let stored = index.get(&id).await.unwrap();
        assert_eq!(stored.file_path, "src/parser.rs");
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let index = InMemoryIndex::new();
        let id = index.insert(fragment("to be removed", "a.rs")).await.unwrap();
        index.insert(fragment("kept", "b.rs")).await.unwrap();
        assert_eq!(index.count().await, 2);

        assert!(index.remove(&id).await);
        assert!(!index.remove(&id).await);
        assert_eq!(index.count().await, 1);

        index.clear().await;
        assert_eq!(index.count().await, 0);
    }

    #[tokio::test]
    async fn keyword_search_matches_and_ranks() {
        let index = InMemoryIndex::new();
        index
            .insert(fragment("tokenizer tokenizer tokenizer", "tok.rs"))
            .await
            .unwrap();
        index
            .insert(fragment(
                "a single mention of tokenizer inside a much longer fragment of text",
                "other.rs",
            ))
            .await
            .unwrap();
        index.insert(fragment("unrelated content", "x.rs")).await.unwrap();

        let hits = index
            .search("tokenizer", &request(10, 0.0))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        // Denser mention ranks first
        assert_eq!(
            hits[0].metadata.get("file_path").and_then(|v| v.as_str()),
            Some("tok.rs")
        );
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn keyword_search_respects_top_k_and_threshold() {
        let index = InMemoryIndex::new();
        for i in 0..10 {
            index
                .insert(fragment("budget budget budget", &format!("f{i}.rs")))
                .await
                .unwrap();
        }

        let hits = index.search("budget", &request(3, 0.0)).await.unwrap();
        assert_eq!(hits.len(), 3);

        let hits = index.search("budget", &request(10, 1e9)).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_query_returns_no_hits() {
        let index = InMemoryIndex::new();
        index.insert(fragment("anything", "a.rs")).await.unwrap();
        let hits = index.search("   ", &request(5, 0.0)).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn hit_metadata_carries_location_fields() {
        let index = InMemoryIndex::new();
        let mut frag = fragment("chunked content", "doc.md");
        frag.start_line = 40;
        frag.end_line = 55;
        frag.original_document_id = Some("doc_42".into());
        frag.chunk_index = Some(2);
        frag.total_chunks = Some(7);
        index.insert(frag).await.unwrap();

        let hits = index.search("chunked", &request(5, 0.0)).await.unwrap();
        let meta = &hits[0].metadata;
        assert_eq!(meta.get("file_path").and_then(|v| v.as_str()), Some("doc.md"));
        assert_eq!(meta.get("start_line").and_then(|v| v.as_u64()), Some(40));
        assert_eq!(meta.get("end_line").and_then(|v| v.as_u64()), Some(55));
        assert_eq!(
            meta.get("original_document_id").and_then(|v| v.as_str()),
            Some("doc_42")
        );
        assert_eq!(meta.get("chunk_index").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(meta.get("total_chunks").and_then(|v| v.as_u64()), Some(7));
    }

    #[tokio::test]
    async fn embedding_search_ranks_by_similarity() {
        let index = InMemoryIndex::new();
        index
            .insert(embedded("orthogonal", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();
        index
            .insert(embedded("identical", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        index
            .insert(embedded("partial", vec![0.5, 0.5, 0.0]))
            .await
            .unwrap();
        // No embedding — skipped entirely
        index.insert(fragment("plain", "plain.rs")).await.unwrap();

        let hits = index
            .search_by_embedding(&[1.0, 0.0, 0.0], 10, 0.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "identical");
        assert_eq!(hits[1].content, "partial");
    }

    #[tokio::test]
    async fn embedding_search_respects_min_score() {
        let index = InMemoryIndex::new();
        index.insert(embedded("close", vec![1.0, 0.0])).await.unwrap();
        index.insert(embedded("far", vec![0.0, 1.0])).await.unwrap();

        let hits = index
            .search_by_embedding(&[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "close");
    }

    #[tokio::test]
    async fn empty_query_embedding_is_an_error() {
        let index = InMemoryIndex::new();
        index.insert(embedded("stored", vec![1.0, 0.0])).await.unwrap();

        let err = index.search_by_embedding(&[], 5, 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::EmbeddingDimension { expected: 2, got: 0 }
        ));
    }

    #[tokio::test]
    async fn mismatched_query_embedding_is_an_error() {
        let index = InMemoryIndex::new();
        index
            .insert(embedded("stored", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let err = index
            .search_by_embedding(&[1.0, 0.0], 5, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::EmbeddingDimension { expected: 3, got: 2 }
        ));
    }

    #[tokio::test]
    async fn insert_rejects_mismatched_embedding_dimension() {
        let index = InMemoryIndex::new();
        index
            .insert(embedded("first", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let err = index
            .insert(embedded("second", vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ragkit_core::Error::Index(IndexError::EmbeddingDimension { expected: 3, got: 2 })
        ));
        // The bad fragment was not stored
        assert_eq!(index.count().await, 1);

        // Plain fragments are unaffected by the dimension check
        index.insert(fragment("plain", "plain.rs")).await.unwrap();
        assert_eq!(index.count().await, 2);
    }
}
