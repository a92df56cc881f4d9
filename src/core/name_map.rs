//! Turns validated entries into an immutable, bidirectional
//! name ↔ short-code map.
//!
//! Build order is fixed so results never depend on hash-map iteration,
//! clocks or randomness:
//! 1. Entries are sorted by canonical name.
//! 2. Declared codes are reserved first, in that order.
//! 3. Missing codes are derived in that order, appending `2`, `3`, … on
//!    collision.
//!
//! A code must never be a whole word of any canonical name or alias. That
//! rule, together with the token shape checked by the schema store, is what
//! makes a rewrite pass idempotent.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::defaults::Settings;
use crate::derive::{self, Derivation};
use crate::error::{Error, Result};
use crate::matcher::{BoundaryRule, Direction, TokenIndex};
use crate::schema::{self, NamingEntry, Schema};

/// An entry with its resolved short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedEntry {
    pub canonical_name: String,
    pub short_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// True when the code was derived rather than declared.
    pub derived: bool,
}

#[derive(Debug)]
pub struct NameMap {
    boundary: BoundaryRule,
    entries: Vec<MappedEntry>,
    by_source: BTreeMap<String, usize>,
    by_code: BTreeMap<String, usize>,
    to_short: TokenIndex,
    to_canonical: TokenIndex,
}

impl NameMap {
    /// Build from a loaded schema, honouring its settings.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        Self::build(&schema.entries, &schema.settings)
    }

    /// Validate `entries`, derive missing codes and build both lookup directions.
    pub fn build(entries: &[NamingEntry], settings: &Settings) -> Result<Self> {
        let boundary = settings.boundary;
        schema::validate(entries, boundary)?;

        let mut sorted: Vec<&NamingEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));

        let words = word_owners(&sorted, boundary);
        let codes = assign_codes(&sorted, &words, settings.derivation)?;

        let mut mapped = Vec::with_capacity(sorted.len());
        let mut by_source = BTreeMap::new();
        let mut by_code = BTreeMap::new();

        for (idx, (entry, (code, derived))) in sorted.iter().zip(codes).enumerate() {
            by_source.insert(entry.canonical_name.clone(), idx);
            for alias in &entry.aliases {
                by_source.insert(alias.clone(), idx);
            }
            by_code.insert(code.clone(), idx);
            mapped.push(MappedEntry {
                canonical_name: entry.canonical_name.clone(),
                short_code: code,
                aliases: entry.aliases.clone(),
                derived,
            });
        }

        let to_short = TokenIndex::build(
            by_source
                .iter()
                .map(|(source, &idx)| (source.clone(), mapped[idx].short_code.clone()))
                .collect(),
        )?;
        let to_canonical = TokenIndex::build(
            by_code
                .iter()
                .map(|(code, &idx)| (code.clone(), mapped[idx].canonical_name.clone()))
                .collect(),
        )?;

        Ok(Self {
            boundary,
            entries: mapped,
            by_source,
            by_code,
            to_short,
            to_canonical,
        })
    }

    /// Short code for a canonical name or alias.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.by_source
            .get(name)
            .map(|&idx| self.entries[idx].short_code.as_str())
    }

    /// Canonical name for a short code.
    pub fn canonical_for(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(code)
            .map(|&idx| self.entries[idx].canonical_name.as_str())
    }

    /// Entries sorted by canonical name.
    pub fn entries(&self) -> &[MappedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn boundary(&self) -> BoundaryRule {
        self.boundary
    }

    /// Number of searchable tokens for a direction.
    pub fn token_count(&self, direction: Direction) -> usize {
        self.index(direction).len()
    }

    pub(crate) fn index(&self, direction: Direction) -> &TokenIndex {
        match direction {
            Direction::ToShort => &self.to_short,
            Direction::ToCanonical => &self.to_canonical,
        }
    }
}

/// Every word of every name and alias, mapped to the first entry using it.
fn word_owners<'a>(
    sorted: &[&'a NamingEntry],
    boundary: BoundaryRule,
) -> BTreeMap<&'a str, &'a str> {
    let mut owners = BTreeMap::new();
    for &entry in sorted {
        let tokens = std::iter::once(&entry.canonical_name).chain(entry.aliases.iter());
        for token in tokens {
            for word in boundary.word_runs(token) {
                owners.entry(word).or_insert(entry.canonical_name.as_str());
            }
        }
    }
    owners
}

/// Resolve one code per entry (same order as `sorted`), flagging derived ones.
fn assign_codes(
    sorted: &[&NamingEntry],
    words: &BTreeMap<&str, &str>,
    derivation: Derivation,
) -> Result<Vec<(String, bool)>> {
    let mut taken: BTreeMap<String, &str> = BTreeMap::new();

    for entry in sorted {
        let Some(code) = entry.short_code.as_deref() else {
            continue;
        };
        let name = entry.canonical_name.as_str();

        if let Some(owner) = taken.get(code) {
            return Err(Error::map_collision(
                code,
                *owner,
                name,
                "both entries declare this short code",
            ));
        }
        if let Some(owner) = words.get(code) {
            return Err(Error::map_collision(
                code,
                *owner,
                name,
                "the short code is also a word of a canonical name or alias",
            ));
        }
        taken.insert(code.to_string(), name);
    }

    let mut codes = Vec::with_capacity(sorted.len());
    for entry in sorted {
        let name = entry.canonical_name.as_str();
        if let Some(code) = &entry.short_code {
            codes.push((code.clone(), false));
            continue;
        }

        let base = derive::candidate(name, derivation);
        let mut code = base.clone();
        let mut n = 2;
        while taken.contains_key(&code) || words.contains_key(code.as_str()) {
            code = derive::with_suffix(&base, n);
            n += 1;
        }

        taken.insert(code.clone(), name);
        codes.push((code, true));
    }

    Ok(codes)
}

// ============================================================================
// Tests
// ============================================================================
