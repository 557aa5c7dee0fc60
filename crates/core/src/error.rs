//! Error types for the ragkit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all ragkit operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Search errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by a search provider.
///
/// These never cross the retrieval boundary: the orchestrator catches them
/// and falls back to an empty context.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),
}

/// Failures from an index implementation.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    EmbeddingDimension { expected: usize, got: usize },
}
