//! # Ragkit Core
//!
//! Domain types, traits, and error definitions for the ragkit context
//! retrieval engine. This crate has **zero framework dependencies** — it
//! defines the domain model that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! The external collaborators (search index, tokenizer) are defined as
//! traits here. Implementations live in their respective crates. This
//! enables:
//! - Swapping search backends via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chunk;
pub mod error;
pub mod search;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use chunk::{Candidate, SourceAttribution};
pub use error::{Error, IndexError, Result, SearchError};
pub use search::{SearchHit, SearchProvider, SearchRequest};
pub use token::{HeuristicCounter, TokenCounter};
