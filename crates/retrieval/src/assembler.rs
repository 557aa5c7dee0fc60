//! Context assembly — greedy budget fitting, formatting, citations.
//!
//! Turns a relevance-sorted candidate list into a budget-compliant context
//! block plus deduplicated source attributions.
//!
//! # Selection
//!
//! Selection is greedy-prefix: candidates are walked in their given order
//! and accumulation stops at the first candidate that would overflow the
//! budget. No skip-ahead is attempted — a smaller later candidate never
//! displaces a more relevant earlier one. This trades packing optimality
//! for strict relevance ordering, deliberately. No fragment is ever
//! partially included.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs: identical candidates and
//! options produce byte-identical output. No random or time-dependent
//! logic is used.

use ragkit_core::chunk::{Candidate, SourceAttribution};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Types ─────────────────────────────────────────────────────────────────

/// Output style for the formatted context block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFormat {
    /// `[file:start-end]` headers followed by raw content.
    #[default]
    Plain,
    /// `### Source N` headings with fenced code blocks.
    Markdown,
}

/// Options controlling budget fitting and formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyOptions {
    /// Token budget for the assembled context.
    pub max_tokens: usize,
    /// Whether formatted text embeds inline citation headers.
    pub include_sources: bool,
    /// Output style.
    pub format: ContextFormat,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            include_sources: true,
            format: ContextFormat::Plain,
        }
    }
}

/// The assembled, budget-compliant context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Selected candidates — a prefix of the input, in relevance order.
    pub chunks: Vec<Candidate>,
    /// Deduplicated citations, one per distinct source location.
    pub sources: Vec<SourceAttribution>,
    /// The formatted block to inject into a prompt. Empty when nothing fits.
    pub context_text: String,
    /// Sum of `tokens` over `chunks`.
    pub total_tokens: usize,
    /// Tokens consumed against the budget. Equals `total_tokens`.
    pub budget_used: usize,
    /// Budget left over: `max_tokens - total_tokens`.
    pub budget_available: usize,
}

impl AssembledContext {
    /// An empty context with the full budget available.
    ///
    /// Returned for empty candidate lists and as the orchestrator's
    /// failure fallback.
    pub fn empty(max_tokens: usize) -> Self {
        Self {
            chunks: Vec::new(),
            sources: Vec::new(),
            context_text: String::new(),
            total_tokens: 0,
            budget_used: 0,
            budget_available: max_tokens,
        }
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    options: AssemblyOptions,
}

impl ContextAssembler {
    /// Create a new assembler with the given options.
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// Create an assembler with the default options (4000-token budget,
    /// plain format, inline citations on).
    pub fn with_default_options() -> Self {
        Self::new(AssemblyOptions::default())
    }

    /// Build a context from candidates pre-sorted by descending score.
    ///
    /// The sort order is a caller precondition: the assembler never
    /// re-sorts, and out-of-order input produces out-of-order output.
    ///
    /// # Algorithm
    ///
    /// 1. Greedy-prefix selection against the token budget
    /// 2. Format the selected candidates into the context block
    /// 3. Derive deduplicated source attributions
    pub fn build(&self, candidates: &[Candidate]) -> AssembledContext {
        let selected = chunks_within_budget(candidates, self.options.max_tokens);
        let total_tokens = estimate_tokens(selected);

        let context_text = if selected.is_empty() {
            String::new()
        } else {
            self.format_context(selected)
        };

        AssembledContext {
            chunks: selected.to_vec(),
            sources: extract_sources(selected),
            context_text,
            total_tokens,
            budget_used: total_tokens,
            budget_available: self.options.max_tokens - total_tokens,
        }
    }

    /// Render the selected candidates, joined by blank lines.
    fn format_context(&self, selected: &[Candidate]) -> String {
        let sections: Vec<String> = selected
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if !self.options.include_sources {
                    return c.content.clone();
                }
                match self.options.format {
                    ContextFormat::Plain => format!(
                        "[{}:{}-{}]\n{}",
                        c.file_path, c.start_line, c.end_line, c.content
                    ),
                    ContextFormat::Markdown => format!(
                        "### Source {}: {}:{}-{}\n```\n{}\n```",
                        i + 1,
                        c.file_path,
                        c.start_line,
                        c.end_line,
                        c.content
                    ),
                }
            })
            .collect();

        sections.join("\n\n")
    }
}

// ── Standalone budget utilities ───────────────────────────────────────────

/// Sum of precomputed token counts over a candidate list.
///
/// Saturates instead of wrapping, so adversarial token counts can never
/// make an over-budget list look small.
pub fn estimate_tokens(candidates: &[Candidate]) -> usize {
    candidates
        .iter()
        .fold(0usize, |sum, c| sum.saturating_add(c.tokens))
}

/// Whether the whole candidate list fits the budget.
pub fn fits_within_budget(candidates: &[Candidate], max_tokens: usize) -> bool {
    estimate_tokens(candidates) <= max_tokens
}

/// The greedy-prefix subset of candidates that fits the budget.
///
/// Walks candidates in order, stopping at the first one that would
/// overflow. Exposed standalone for callers that only need the subset
/// without formatting.
pub fn chunks_within_budget(candidates: &[Candidate], max_tokens: usize) -> &[Candidate] {
    let mut used = 0usize;
    let mut end = 0usize;
    for candidate in candidates {
        let Some(next) = used.checked_add(candidate.tokens) else {
            break;
        };
        if next > max_tokens {
            break;
        }
        used = next;
        end += 1;
    }
    &candidates[..end]
}

/// Deduplicated source attributions for the selected candidates.
///
/// One entry per distinct `(file_path, start_line, end_line)`; the first
/// (highest-relevance) occurrence wins. Different line ranges in the same
/// file stay distinct.
fn extract_sources(selected: &[Candidate]) -> Vec<SourceAttribution> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for candidate in selected {
        if seen.insert(candidate.location_key()) {
            sources.push(SourceAttribution::from_candidate(candidate));
        }
    }
    sources
}

// ── Tests ─────────────────────────────────────────────────────────────────
