//! Search provider trait — the external index boundary.
//!
//! The retrieval engine does not own an index; it consumes any backend that
//! returns a relevance-sorted list of scored hits for a query. Backends may
//! be remote vector databases, local embedding stores, or the in-memory
//! reference index in `ragkit-index`.

use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for a single search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Maximum number of hits to return.
    pub top_k: usize,

    /// Minimum relevance score; hits below this are filtered by the provider.
    pub threshold: f32,
}

/// A raw search hit as produced by a provider.
///
/// Source-location fields travel in the open `metadata` map; the retrieval
/// orchestrator lifts them into typed [`Candidate`](crate::Candidate)
/// fields, defaulting anything absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// The search collaborator boundary.
///
/// Implementations must return hits sorted by descending score.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// The provider name (e.g. "in_memory", "qdrant").
    fn name(&self) -> &str;

    /// Whether the provider is usable.
    ///
    /// Defaults to ready-after-construction — an assumption, not a
    /// guarantee. Providers with a real readiness signal should override.
    fn is_ready(&self) -> bool {
        true
    }

    /// Execute a query, returning hits sorted by descending score.
    async fn search(
        &self,
        query: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
