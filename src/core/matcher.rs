//! Finds known names or codes inside arbitrary text.
//!
//! All tokens of one direction live in a single Aho-Corasick automaton, so a
//! buffer is scanned once no matter how many entries the schema declares.
//! Candidates are then filtered by the boundary rule and resolved
//! leftmost-first, longest-first into non-overlapping spans.

use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::name_map::NameMap;

// ============================================================================
// Boundary rules
// ============================================================================

/// Which characters continue an identifier. A match may not start or end
/// next to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryRule {
    /// Letters, digits and `_`.
    #[default]
    Identifier,
    /// Letters and digits only; `_` separates (`load_Cache` contains `Cache`).
    Alphanumeric,
}

impl BoundaryRule {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "identifier" => Ok(BoundaryRule::Identifier),
            "alphanumeric" => Ok(BoundaryRule::Alphanumeric),
            _ => Err(Error::validation_invalid_argument(
                "boundary",
                format!("Unknown boundary rule '{}'. Use: identifier, alphanumeric", s),
                Some(vec!["identifier".to_string(), "alphanumeric".to_string()]),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryRule::Identifier => "identifier",
            BoundaryRule::Alphanumeric => "alphanumeric",
        }
    }

    pub fn is_word_char(&self, c: char) -> bool {
        match self {
            BoundaryRule::Identifier => c.is_alphanumeric() || c == '_',
            BoundaryRule::Alphanumeric => c.is_alphanumeric(),
        }
    }

    /// True when `text[start..end]` is not glued to a word character on either side.
    pub fn is_bounded(&self, text: &str, start: usize, end: usize) -> bool {
        let left_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !self.is_word_char(c));
        let right_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !self.is_word_char(c));
        left_ok && right_ok
    }

    /// Maximal runs of word characters in `text`.
    pub fn word_runs<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(|c: char| !self.is_word_char(c))
            .filter(|run| !run.is_empty())
            .collect()
    }
}

// ============================================================================
// Types
// ============================================================================

/// Rewrite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Canonical names and aliases become short codes.
    #[default]
    ToShort,
    /// Short codes become canonical names.
    ToCanonical,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToShort => "toShort",
            Direction::ToCanonical => "toCanonical",
        }
    }
}

/// One located occurrence. `start..end` are byte offsets on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub source_token: String,
    pub replacement: String,
}

/// A span resolved to a human-readable position, for previews.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column in characters (1-indexed).
    pub column: usize,
    pub matched: String,
    pub replacement: String,
    /// The full line content for context.
    pub context: String,
}

// ============================================================================
// Token index
// ============================================================================

/// Search structure for one direction: every source token and what it becomes.
#[derive(Debug)]
pub(crate) struct TokenIndex {
    automaton: AhoCorasick,
    tokens: Vec<String>,
    replacements: Vec<String>,
}

impl TokenIndex {
    pub(crate) fn build(pairs: Vec<(String, String)>) -> Result<Self> {
        let (tokens, replacements): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        // Standard semantics are required for overlapping iteration.
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&tokens)
            .map_err(|e| Error::internal_unexpected(format!("build token automaton: {}", e)))?;

        Ok(Self {
            automaton,
            tokens,
            replacements,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn find(&self, text: &str, boundary: BoundaryRule) -> Vec<MatchSpan> {
        let mut candidates: Vec<(usize, usize, usize)> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| boundary.is_bounded(text, m.start(), m.end()))
            .map(|m| (m.start(), m.end(), m.pattern().as_usize()))
            .collect();

        // Leftmost first, then longest first at the same start.
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut spans = Vec::new();
        let mut cursor = 0;
        for (start, end, pattern) in candidates {
            if start < cursor {
                continue;
            }
            cursor = end;
            spans.push(MatchSpan {
                start,
                end,
                source_token: self.tokens[pattern].clone(),
                replacement: self.replacements[pattern].clone(),
            });
        }

        spans
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Find every non-overlapping occurrence of the map's tokens for `direction`.
pub fn find(text: &str, map: &NameMap, direction: Direction) -> Vec<MatchSpan> {
    map.index(direction).find(text, map.boundary())
}

/// Resolve spans to line/column references.
pub fn locate(text: &str, spans: &[MatchSpan]) -> Vec<Reference> {
    let mut references = Vec::with_capacity(spans.len());
    let mut line_no = 1;
    let mut line_start = 0;
    let mut scanned = 0;

    for span in spans {
        for (offset, c) in text[scanned..span.start].char_indices() {
            if c == '\n' {
                line_no += 1;
                line_start = scanned + offset + 1;
            }
        }
        scanned = span.start;

        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |pos| line_start + pos);
        let context = text[line_start..line_end].trim_end_matches('\r');

        references.push(Reference {
            line: line_no,
            column: text[line_start..span.start].chars().count() + 1,
            matched: span.source_token.clone(),
            replacement: span.replacement.clone(),
            context: context.to_string(),
        });
    }

    references
}

// ============================================================================
// Tests
// ============================================================================
