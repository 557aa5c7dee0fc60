//! Context retrieval and budget assembly for RAG prompt augmentation.
//!
//! Given a user query, this crate selects the most relevant indexed
//! fragments, fits them within a hard token budget, deduplicates
//! overlapping citations, and produces both a formatted context block
//! (for prompt injection) and a structured source list (for UI display).
//!
//! Two cooperating components, consumed leaf-first:
//!
//! - [`ContextAssembler`] — pure, deterministic budget fitting and
//!   formatting over a scored candidate list
//! - [`ContextRetriever`] — query execution against a
//!   [`SearchProvider`](ragkit_core::SearchProvider), hit conversion,
//!   latency observation, and the no-throw failure policy
//!
//! Callers embed [`AssembledContext::context_text`] into a system prompt
//! and fall back to an unaugmented prompt whenever it is empty — including
//! when the provider failed, which this crate never surfaces as an error.

pub mod assembler;
pub mod orchestrator;

pub use assembler::{
    AssembledContext, AssemblyOptions, ContextAssembler, ContextFormat, chunks_within_budget,
    estimate_tokens, fits_within_budget,
};
pub use orchestrator::{ContextRetriever, LATENCY_TARGET, RetrievalOptions};
