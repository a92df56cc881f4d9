//! Applies matcher spans to a text buffer.

use crate::matcher::{self, Direction, MatchSpan};
use crate::name_map::NameMap;

/// Rewritten text together with the spans that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub spans: Vec<MatchSpan>,
}

impl Rewrite {
    pub fn is_changed(&self) -> bool {
        !self.spans.is_empty()
    }
}

/// Replace each span, left to right.
///
/// Total over any input: spans that overlap an earlier one, run past the end
/// of `text`, or cut a UTF-8 character are skipped.
pub fn apply(text: &str, spans: &[MatchSpan]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for span in spans {
        let valid = span.start >= cursor
            && span.start <= span.end
            && span.end <= text.len()
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end);
        if !valid {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(&span.replacement);
        cursor = span.end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Find and apply in one step.
pub fn rewrite(text: &str, map: &NameMap, direction: Direction) -> Rewrite {
    let spans = matcher::find(text, map, direction);
    let text = apply(text, &spans);
    Rewrite { text, spans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Settings;
    use crate::matcher::BoundaryRule;
    use crate::schema::NamingEntry;

    fn entry(name: &str, code: Option<&str>, aliases: &[&str]) -> NamingEntry {
        NamingEntry {
            canonical_name: name.to_string(),
            short_code: code.map(str::to_string),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn sample_map(boundary: BoundaryRule) -> NameMap {
        let settings = Settings {
            boundary,
            ..Settings::default()
        };
        NameMap::build(
            &[
                entry("NamingEngine", Some("NE"), &["Naming Engine", "naming_engine"]),
                entry("ShortCode", None, &[]),
                entry("Cache", None, &[]),
                entry("CacheLayer", Some("CL"), &["cache layer"]),
                entry("Engine", None, &[]),
            ],
            &settings,
        )
        .unwrap()
    }

    const CORPUS: &[&str] = &[
        "NamingEngine uses ShortCode.",
        "let layer = CacheLayer::new(Cache::default());",
        "// the Naming Engine drives the cache layer; Engine is separate",
        "naming_engine::run(NE, SC, CL)",
        "CacheLayers and MyCache and Cache_Layer stay put",
        "Cache-Cache/CacheLayer.Engine",
        "",
        "EngineEngine Engine\tEngine\nCache",
    ];

    #[test]
    fn scenario_rewrites_and_second_pass_is_empty() {
        let map = NameMap::build(
            &[entry("NamingEngine", Some("NE"), &[]), entry("ShortCode", None, &[])],
            &Settings::default(),
        )
        .unwrap();

        let first = rewrite("NamingEngine uses ShortCode.", &map, Direction::ToShort);
        assert_eq!(first.text, "NE uses SC.");
        assert_eq!(first.spans.len(), 2);

        let second = rewrite(&first.text, &map, Direction::ToShort);
        assert!(second.spans.is_empty());
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn rewriting_is_idempotent_in_both_directions() {
        for boundary in [BoundaryRule::Identifier, BoundaryRule::Alphanumeric] {
            let map = sample_map(boundary);
            for direction in [Direction::ToShort, Direction::ToCanonical] {
                for text in CORPUS {
                    let once = rewrite(text, &map, direction);
                    let twice = rewrite(&once.text, &map, direction);
                    assert!(
                        twice.spans.is_empty(),
                        "{:?}/{:?}: second pass over {:?} found {:?}",
                        boundary,
                        direction,
                        once.text,
                        twice.spans
                    );
                    assert_eq!(twice.text, once.text);
                }
            }
        }
    }

    #[test]
    fn aliases_rewrite_to_the_same_code() {
        let map = sample_map(BoundaryRule::Identifier);
        let out = rewrite("Naming Engine, naming_engine, NamingEngine", &map, Direction::ToShort);
        assert_eq!(out.text, "NE, NE, NE");
    }

    #[test]
    fn reverse_direction_restores_canonical_names() {
        let map = sample_map(BoundaryRule::Identifier);
        let short = rewrite("CacheLayer wraps Cache", &map, Direction::ToShort);
        assert_eq!(short.text, "CL wraps C");

        let back = rewrite(&short.text, &map, Direction::ToCanonical);
        assert_eq!(back.text, "CacheLayer wraps Cache");
    }

    #[test]
    fn apply_without_spans_is_identity() {
        assert_eq!(apply("unchanged", &[]), "unchanged");
    }

    #[test]
    fn apply_skips_invalid_spans() {
        let span = |start, end| MatchSpan {
            start,
            end,
            source_token: String::new(),
            replacement: "X".to_string(),
        };
        let text = "aé bc";
        // Overlapping, out of range and mid-character spans are ignored.
        let out = apply(text, &[span(0, 1), span(0, 1), span(2, 3), span(4, 5), span(5, 99)]);
        assert_eq!(out, "Xé Xc");
    }
}
