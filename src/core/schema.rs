//! Loads and validates naming entries.
//!
//! A schema document is either a bare list of entries or an object with
//! `entries` and an optional `settings` block. JSON, TOML and YAML are
//! accepted, chosen by file extension. Loading is all-or-nothing: every
//! problem is collected and reported in a single error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::defaults::Settings;
use crate::error::{Error, Result};
use crate::matcher::BoundaryRule;

/// File names tried, in order, when no schema path is given.
pub const DEFAULT_SCHEMA_FILES: &[&str] = &[
    "shorthand.json",
    "shorthand.toml",
    "shorthand.yaml",
    "shorthand.yml",
];

/// One canonical name, its optional short code and alternative spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NamingEntry {
    #[serde(alias = "name")]
    pub canonical_name: String,
    #[serde(default, alias = "code", skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub entries: Vec<NamingEntry>,
    pub settings: Settings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    entries: Vec<NamingEntry>,
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Toml,
    Yaml,
}

impl SchemaFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(SchemaFormat::Json),
            Some("toml") => Ok(SchemaFormat::Toml),
            Some("yaml") | Some("yml") => Ok(SchemaFormat::Yaml),
            _ => Err(Error::validation_invalid_argument(
                "schema",
                format!(
                    "Cannot tell the format of '{}'. Use a .json, .toml, .yaml or .yml file",
                    path.display()
                ),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Json => "json",
            SchemaFormat::Toml => "toml",
            SchemaFormat::Yaml => "yaml",
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Find the default schema file in `dir`.
pub fn find_default(dir: &Path) -> Option<PathBuf> {
    DEFAULT_SCHEMA_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Load and validate a schema file.
pub fn load(path: &Path) -> Result<Schema> {
    let format = SchemaFormat::from_path(path)?;
    let source = path.display().to_string();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::schema_parse(&source, format.as_str(), e.to_string()))?;
    load_str(&text, format, &source)
}

/// Parse and validate a schema document held in memory.
pub fn load_str(text: &str, format: SchemaFormat, source: &str) -> Result<Schema> {
    let parse_err = |e: String| Error::schema_parse(source, format.as_str(), e);

    let value: Value = match format {
        SchemaFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        SchemaFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        SchemaFormat::Yaml => serde_yml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
    };

    let schema = if value.is_array() {
        let entries: Vec<NamingEntry> =
            serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
        Schema {
            entries,
            settings: Settings::default(),
        }
    } else {
        let doc: SchemaDocument =
            serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
        Schema {
            entries: doc.entries,
            settings: doc.settings,
        }
    };

    let problems = problems(&schema.entries, schema.settings.boundary);
    if !problems.is_empty() {
        return Err(Error::schema_invalid(Some(source.to_string()), problems));
    }

    Ok(schema)
}

// ============================================================================
// Validation
// ============================================================================

/// Validate entries, failing with every problem found.
pub fn validate(entries: &[NamingEntry], boundary: BoundaryRule) -> Result<()> {
    let problems = problems(entries, boundary);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::schema_invalid(None, problems))
    }
}

/// Collect every self-consistency problem in `entries`.
///
/// Short-code uniqueness is not checked here; that belongs to the map builder,
/// which also has to account for derived codes.
pub fn problems(entries: &[NamingEntry], boundary: BoundaryRule) -> Vec<String> {
    let mut problems = Vec::new();
    let mut canonical: BTreeMap<&str, usize> = BTreeMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        let name = entry.canonical_name.as_str();
        if name.trim().is_empty() {
            problems.push(format!("entry #{} has an empty canonicalName", idx + 1));
            continue;
        }
        if let Some(problem) = token_shape_problem(name, boundary) {
            problems.push(format!("canonicalName '{}' {}", name, problem));
        }
        if canonical.insert(name, idx).is_some() {
            problems.push(format!("canonicalName '{}' is declared more than once", name));
        }

        if let Some(code) = &entry.short_code {
            if code.is_empty() {
                problems.push(format!("'{}' declares an empty shortCode", name));
            } else if !code.chars().all(|c| boundary.is_word_char(c)) {
                problems.push(format!(
                    "shortCode '{}' of '{}' must contain only {} characters",
                    code,
                    name,
                    boundary.as_str()
                ));
            }
        }
    }

    let codes: BTreeMap<&str, &str> = entries
        .iter()
        .filter_map(|e| {
            e.short_code
                .as_deref()
                .map(|code| (code, e.canonical_name.as_str()))
        })
        .collect();

    let mut seen_aliases: BTreeMap<&str, &str> = BTreeMap::new();
    for entry in entries {
        let owner = entry.canonical_name.as_str();
        let mut own = BTreeSet::new();
        for alias in &entry.aliases {
            if alias.trim().is_empty() {
                problems.push(format!("'{}' declares an empty alias", owner));
                continue;
            }
            if let Some(problem) = token_shape_problem(alias, boundary) {
                problems.push(format!("alias '{}' of '{}' {}", alias, owner, problem));
            }
            if !own.insert(alias.as_str()) {
                problems.push(format!("alias '{}' is listed twice by '{}'", alias, owner));
                continue;
            }
            if canonical.contains_key(alias.as_str()) {
                problems.push(format!(
                    "alias '{}' of '{}' collides with a canonicalName",
                    alias, owner
                ));
            }
            if let Some(code_owner) = codes.get(alias.as_str()) {
                problems.push(format!(
                    "alias '{}' of '{}' collides with the shortCode of '{}'",
                    alias, owner, code_owner
                ));
            }
            if let Some(other) = seen_aliases.insert(alias.as_str(), owner) {
                problems.push(format!(
                    "alias '{}' is declared by both '{}' and '{}'",
                    alias, other, owner
                ));
            }
        }
    }

    problems
}

fn token_shape_problem(token: &str, boundary: BoundaryRule) -> Option<String> {
    let starts = token.chars().next().is_some_and(|c| boundary.is_word_char(c));
    let ends = token.chars().next_back().is_some_and(|c| boundary.is_word_char(c));
    if starts && ends {
        None
    } else {
        Some(format!(
            "must start and end with an {} character",
            boundary.as_str()
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn loads_bare_json_list() {
        let schema = load_str(
            r#"[{"canonicalName": "NamingEngine", "shortCode": "NE"}, {"name": "ShortCode"}]"#,
            SchemaFormat::Json,
            "inline",
        )
        .unwrap();

        assert_eq!(schema.entries.len(), 2);
        assert_eq!(schema.entries[0].short_code.as_deref(), Some("NE"));
        assert_eq!(schema.entries[1].canonical_name, "ShortCode");
        assert_eq!(schema.settings, Settings::default());
    }

    #[test]
    fn loads_toml_document_with_settings() {
        let text = r#"
[settings]
boundary = "alphanumeric"
derivation = "hash"

[[entries]]
canonicalName = "NamingEngine"
aliases = ["Naming Engine"]
"#;
        let schema = load_str(text, SchemaFormat::Toml, "names.toml").unwrap();
        assert_eq!(schema.entries[0].aliases, vec!["Naming Engine"]);
        assert_eq!(schema.settings.boundary, BoundaryRule::Alphanumeric);
    }

    #[test]
    fn loads_yaml_document() {
        let text = "entries:\n  - canonicalName: CacheLayer\n    code: CL\n";
        let schema = load_str(text, SchemaFormat::Yaml, "names.yaml").unwrap();
        assert_eq!(schema.entries[0].short_code.as_deref(), Some("CL"));
    }

    #[test]
    fn unparsable_source_is_a_parse_error() {
        let err = load_str("{not json", SchemaFormat::Json, "broken.json").unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaParseFailed);
        assert_eq!(err.details["source"], "broken.json");
    }

    #[test]
    fn unknown_entry_field_is_rejected() {
        let err = load_str(
            r#"[{"canonicalName": "A", "shortcode": "X"}]"#,
            SchemaFormat::Json,
            "inline",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaParseFailed);
    }

    #[test]
    fn duplicate_canonical_name_fails_whole_load() {
        let err = load_str(
            r#"[{"canonicalName": "Cache"}, {"canonicalName": "Cache"}, {"canonicalName": "Other"}]"#,
            SchemaFormat::Json,
            "inline",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaInvalid);
        assert!(err.message.contains("declared more than once"));
    }

    #[test]
    fn alias_collisions_are_all_reported() {
        let entries = vec![
            NamingEntry {
                canonical_name: "Cache".to_string(),
                short_code: Some("C".to_string()),
                aliases: vec!["Store".to_string(), "Buffer".to_string()],
            },
            NamingEntry {
                canonical_name: "Store".to_string(),
                short_code: None,
                aliases: vec!["Buffer".to_string(), "C".to_string()],
            },
        ];

        let problems = problems(&entries, BoundaryRule::Identifier);
        assert_eq!(problems.len(), 3, "{:?}", problems);
        assert!(problems.iter().any(|p| p.contains("'Store' of 'Cache' collides with a canonicalName")));
        assert!(problems.iter().any(|p| p.contains("declared by both 'Cache' and 'Store'")));
        assert!(problems.iter().any(|p| p.contains("shortCode of 'Cache'")));
    }

    #[test]
    fn token_shape_is_enforced() {
        let entries = vec![
            NamingEntry {
                canonical_name: "Cache.".to_string(),
                short_code: Some("C-1".to_string()),
                aliases: vec![" cache".to_string()],
            },
            NamingEntry {
                canonical_name: "".to_string(),
                short_code: None,
                aliases: Vec::new(),
            },
        ];

        let problems = problems(&entries, BoundaryRule::Identifier);
        assert_eq!(problems.len(), 4, "{:?}", problems);
        assert!(validate(&entries, BoundaryRule::Identifier).is_err());
    }

    #[test]
    fn token_shape_message_names_boundary_rule() {
        let entries = vec![NamingEntry {
            canonical_name: "_Cache".to_string(),
            short_code: None,
            aliases: vec!["cache.".to_string()],
        }];

        assert!(problems(&entries, BoundaryRule::Identifier)
            .iter()
            .all(|p| !p.contains("canonicalName")));

        let problems = problems(&entries, BoundaryRule::Alphanumeric);
        assert_eq!(problems.len(), 2, "{:?}", problems);
        assert!(problems.contains(
            &"canonicalName '_Cache' must start and end with an alphanumeric character".to_string()
        ));
        assert!(problems.contains(
            &"alias 'cache.' of '_Cache' must start and end with an alphanumeric character"
                .to_string()
        ));
    }

    #[test]
    fn underscore_codes_depend_on_boundary_rule() {
        let entries = vec![NamingEntry {
            canonical_name: "CacheLayer".to_string(),
            short_code: Some("C_L".to_string()),
            aliases: Vec::new(),
        }];
        assert!(validate(&entries, BoundaryRule::Identifier).is_ok());
        assert!(validate(&entries, BoundaryRule::Alphanumeric).is_err());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("a.yml")).unwrap(), SchemaFormat::Yaml);
        assert!(SchemaFormat::from_path(Path::new("a.ini")).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shorthand.json");
        std::fs::write(&path, r#"{"entries": [{"canonicalName": "Cache"}]}"#).unwrap();

        assert_eq!(find_default(dir.path()), Some(path.clone()));
        let schema = load(&path).unwrap();
        assert_eq!(schema.entries.len(), 1);

        let missing = load(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(missing.code, ErrorCode::SchemaParseFailed);
    }
}
