//! Deterministic short-code candidates.
//!
//! A candidate depends only on the canonical name. Collision handling (the
//! numeric suffix) lives in the map builder, which owns the iteration order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a missing short code is derived from a canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivation {
    /// First letter of every word: `NamingEngine` → `NE`.
    #[default]
    Initials,
    /// First initial plus six hex digits of the SHA-256 of the name.
    Hash,
}

/// Number of hex digits kept by [`Derivation::Hash`].
const HASH_DIGITS: usize = 6;

pub fn candidate(canonical_name: &str, strategy: Derivation) -> String {
    match strategy {
        Derivation::Initials => {
            let code = initials(canonical_name);
            // Names made only of underscores have no initials.
            if code.is_empty() {
                hashed(canonical_name)
            } else {
                code
            }
        }
        Derivation::Hash => hashed(canonical_name),
    }
}

/// Append the n-th collision suffix.
pub fn with_suffix(base: &str, n: usize) -> String {
    format!("{}{}", base, n)
}

/// Uppercased first character of every word.
///
/// Words split on non-alphanumerics, lower→upper humps (`shortCode`),
/// acronym ends (`HTTPServer` → `HS`) and letter/digit transitions
/// (`Layer2Cache` → `L2C`).
fn initials(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let starts_word = match prev {
            None => true,
            Some(p) if !p.is_alphanumeric() => true,
            Some(p) if p.is_lowercase() && c.is_uppercase() => true,
            Some(p) if p.is_uppercase() && c.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
            Some(p) => p.is_numeric() != c.is_numeric(),
        };

        if starts_word {
            out.extend(c.to_uppercase());
        }
    }

    out
}

fn hashed(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let hex = format!("{:x}", digest);
    let lead = initials(name).chars().next().unwrap_or('X');
    format!("{}{}", lead, hex[..HASH_DIGITS].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_of_camel_case() {
        assert_eq!(candidate("NamingEngine", Derivation::Initials), "NE");
        assert_eq!(candidate("ShortCode", Derivation::Initials), "SC");
        assert_eq!(candidate("shortCode", Derivation::Initials), "SC");
        assert_eq!(candidate("Alpha", Derivation::Initials), "A");
    }

    #[test]
    fn initials_of_separated_words() {
        assert_eq!(candidate("naming_engine", Derivation::Initials), "NE");
        assert_eq!(candidate("Naming Engine v2", Derivation::Initials), "NEV2");
        assert_eq!(candidate("short-code", Derivation::Initials), "SC");
    }

    #[test]
    fn initials_of_acronyms_and_digits() {
        assert_eq!(candidate("HTTPServer", Derivation::Initials), "HS");
        assert_eq!(candidate("Layer2Cache", Derivation::Initials), "L2C");
        assert_eq!(candidate("IO", Derivation::Initials), "I");
    }

    #[test]
    fn hash_is_stable_and_fixed_length() {
        let first = candidate("NamingEngine", Derivation::Hash);
        let second = candidate("NamingEngine", Derivation::Hash);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1 + HASH_DIGITS);
        assert!(first.starts_with('N'));
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, candidate("NamingEngines", Derivation::Hash));
    }

    #[test]
    fn underscore_only_name_falls_back_to_hash() {
        let code = candidate("__", Derivation::Initials);
        assert_eq!(code.len(), 1 + HASH_DIGITS);
        assert!(code.starts_with('X'));
    }

    #[test]
    fn suffix_appends_number() {
        assert_eq!(with_suffix("A", 2), "A2");
    }
}
