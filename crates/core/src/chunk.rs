//! Candidate fragments and source attributions.
//!
//! A [`Candidate`] is a scored fragment of indexed content as seen by the
//! assembler: search hit plus typed source location and a precomputed token
//! count. A [`SourceAttribution`] is the citation pointer derived from an
//! included candidate, consumed by UI layers for click-to-navigate.
//!
//! Candidates are request-scoped: created per retrieval call, never cached
//! or mutated by this engine.

use serde::{Deserialize, Serialize};

/// Maximum snippet length (in characters) for a source attribution.
pub const SNIPPET_MAX_CHARS: usize = 100;

/// A scored fragment of indexed content, before budget selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque fragment identifier.
    pub id: String,

    /// The fragment text.
    pub content: String,

    /// Relevance score (provider-defined range, higher = more relevant).
    /// Candidates arrive pre-sorted descending by this value.
    pub score: f32,

    /// Precomputed token count of `content`.
    pub tokens: usize,

    /// Logical source location (file path, URL, etc.).
    pub file_path: String,

    /// 1-based inclusive start line within the source.
    pub start_line: u32,

    /// 1-based inclusive end line within the source.
    pub end_line: u32,

    /// Parent document ID when this fragment was produced by chunking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_document_id: Option<String>,

    /// Position of this fragment within its parent's chunk sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,

    /// Total chunks in the parent document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
}

impl Candidate {
    /// Dedup key for source attribution: `file:start-end`.
    ///
    /// Different line ranges in the same file are distinct locations.
    pub fn location_key(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }
}

/// A deduplicated citation pointing back to the origin of an included chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,

    /// Relevance score of the originating candidate.
    pub score: f32,

    /// First 100 characters of the content, `...`-suffixed when truncated.
    pub snippet: String,
}

impl SourceAttribution {
    /// Build an attribution from the candidate it points back to.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            file_path: candidate.file_path.clone(),
            start_line: candidate.start_line,
            end_line: candidate.end_line,
            score: candidate.score,
            snippet: make_snippet(&candidate.content),
        }
    }
}

/// Truncate content to a display snippet.
///
/// Counted in chars, not bytes, so multi-byte text never splits
/// mid-character.
fn make_snippet(content: &str) -> String {
    let mut chars = content.chars();
    let truncated: String = chars.by_ref().take(SNIPPET_MAX_CHARS).collect();
    if chars.next().is_none() {
        truncated
    } else {
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(content: &str) -> Candidate {
        Candidate {
            id: "frag_1".into(),
            content: content.into(),
            score: 0.9,
            tokens: 10,
            file_path: "src/main.rs".into(),
            start_line: 1,
            end_line: 5,
            original_document_id: None,
            chunk_index: None,
            total_chunks: None,
        }
    }

    #[test]
    fn short_content_is_not_truncated() {
        // 31 chars — well under the snippet cap
        let c = candidate("function test() { return 42; }");
        let attr = SourceAttribution::from_candidate(&c);
        assert_eq!(attr.snippet, "function test() { return 42; }");
    }

    #[test]
    fn exactly_100_chars_is_not_truncated() {
        let content = "a".repeat(100);
        let c = candidate(&content);
        let attr = SourceAttribution::from_candidate(&c);
        assert_eq!(attr.snippet, content);
    }

    #[test]
    fn long_content_gets_ellipsis() {
        let c = candidate(&"a".repeat(150));
        let attr = SourceAttribution::from_candidate(&c);
        assert_eq!(attr.snippet.chars().count(), 103);
        assert!(attr.snippet.ends_with("..."));
    }

    #[test]
    fn multibyte_content_truncates_on_char_boundary() {
        let c = candidate(&"é".repeat(120));
        let attr = SourceAttribution::from_candidate(&c);
        assert_eq!(attr.snippet.chars().count(), 103);
    }

    #[test]
    fn location_key_includes_line_range() {
        let c = candidate("fn main() {}");
        assert_eq!(c.location_key(), "src/main.rs:1-5");
    }

    #[test]
    fn attribution_copies_location_and_score() {
        let c = candidate("fn main() {}");
        let attr = SourceAttribution::from_candidate(&c);
        assert_eq!(attr.file_path, "src/main.rs");
        assert_eq!(attr.start_line, 1);
        assert_eq!(attr.end_line, 5);
        assert_eq!(attr.score, 0.9);
    }

    #[test]
    fn optional_fields_omitted_from_json() {
        let c = candidate("fn main() {}");
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("original_document_id"));
        assert!(!json.contains("chunk_index"));
    }
}
