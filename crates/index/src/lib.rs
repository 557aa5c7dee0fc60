//! In-memory reference search provider for ragkit.
//!
//! Production deployments plug a real vector database in behind the
//! [`SearchProvider`](ragkit_core::SearchProvider) trait; this crate provides
//! a self-contained index for tests and embedded sessions. Fragments are
//! scored by keyword occurrence, or by cosine similarity when they carry
//! embeddings.

pub mod in_memory;
pub mod vector;

pub use in_memory::{InMemoryIndex, IndexedFragment};
pub use vector::cosine_similarity;
