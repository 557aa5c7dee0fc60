//! Retrieval orchestration — query → search → convert → assemble.
//!
//! Bridges a free-text query to an [`AssembledContext`], enforcing the
//! no-throw failure policy: a provider failure is logged and converted
//! into an empty context so prompt generation proceeds unaugmented.
//! Retrieval sits on the critical path of every augmented request and
//! must never block the caller's primary workflow.
//!
//! # Flow
//!
//! 1. Resolve options against defaults
//! 2. Query the search provider with `(top_k, threshold)`
//! 3. Lift raw hits into typed candidates (token counts, location metadata)
//! 4. Delegate to the context assembler
//! 5. Log a warning when the soft latency target is exceeded

use crate::assembler::{AssembledContext, AssemblyOptions, ContextAssembler, ContextFormat};
use ragkit_core::chunk::Candidate;
use ragkit_core::search::{SearchHit, SearchProvider, SearchRequest};
use ragkit_core::token::TokenCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Soft latency target for a retrieval call.
///
/// Exceeding it logs a warning; the call still completes normally. This is
/// advisory observability, not an enforced deadline — callers needing a
/// hard timeout must wrap the provider.
pub const LATENCY_TARGET: Duration = Duration::from_millis(100);

/// Options for a retrieval call. All fields have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOptions {
    /// Maximum candidates requested from the search provider.
    pub top_k: usize,
    /// Relevance floor passed to the search provider.
    pub min_score: f32,
    /// Token budget for assembly.
    pub max_tokens: usize,
    /// Whether formatted text embeds inline citations.
    pub include_sources: bool,
    /// Output style.
    pub format: ContextFormat,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.3,
            max_tokens: 4000,
            include_sources: true,
            format: ContextFormat::Plain,
        }
    }
}

impl RetrievalOptions {
    fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            max_tokens: self.max_tokens,
            include_sources: self.include_sources,
            format: self.format,
        }
    }
}

/// The retrieval orchestrator.
///
/// Holds a search provider and a token counter, injected at construction;
/// no mutable state between calls, so concurrent calls are independent.
pub struct ContextRetriever {
    search: Arc<dyn SearchProvider>,
    counter: Arc<dyn TokenCounter>,
}

impl ContextRetriever {
    pub fn new(search: Arc<dyn SearchProvider>, counter: Arc<dyn TokenCounter>) -> Self {
        Self { search, counter }
    }

    /// Retrieve and assemble context for a query.
    ///
    /// Never fails: any provider error is logged with query context and
    /// mapped to an empty context, so the caller falls back to an
    /// unaugmented prompt.
    pub async fn retrieve_context(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> AssembledContext {
        let started = Instant::now();
        let request = SearchRequest {
            top_k: options.top_k,
            threshold: options.min_score,
        };

        let hits = match self.search.search(query, &request).await {
            Ok(hits) => hits,
            Err(e) => {
                error!(
                    provider = self.search.name(),
                    query,
                    error = %e,
                    "retrieval failed, returning empty context"
                );
                return AssembledContext::empty(options.max_tokens);
            }
        };

        let candidates: Vec<Candidate> =
            hits.into_iter().map(|hit| self.to_candidate(hit)).collect();

        let assembled = ContextAssembler::new(options.assembly_options()).build(&candidates);

        let elapsed = started.elapsed();
        if elapsed > LATENCY_TARGET {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                target_ms = LATENCY_TARGET.as_millis() as u64,
                query,
                "retrieval exceeded latency target"
            );
        }

        debug!(
            chunks = assembled.chunks.len(),
            sources = assembled.sources.len(),
            total_tokens = assembled.total_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "context retrieved"
        );

        assembled
    }

    /// Whether the underlying search provider is usable.
    pub fn is_ready(&self) -> bool {
        self.search.is_ready()
    }

    /// Lift a raw hit into a typed candidate.
    ///
    /// Malformed or absent metadata is defaulted, never rejected:
    /// `file_path` falls back to the hit id, line numbers default to 1.
    fn to_candidate(&self, hit: SearchHit) -> Candidate {
        let meta = &hit.metadata;
        let file_path = meta
            .get("file_path")
            .and_then(|v| v.as_str())
            .unwrap_or(&hit.id)
            .to_string();
        // Out-of-range values fall back to the default, never truncate.
        let start_line = meta
            .get("start_line")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(1);
        let end_line = meta
            .get("end_line")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(1);
        let original_document_id = meta
            .get("original_document_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let chunk_index = meta
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize);
        let total_chunks = meta
            .get("total_chunks")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize);
        let tokens = self.counter.count(&hit.content);

        Candidate {
            id: hit.id,
            content: hit.content,
            score: hit.score,
            tokens,
            file_path,
            start_line,
            end_line,
            original_document_id,
            chunk_index,
            total_chunks,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
