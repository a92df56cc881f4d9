use serde::{Deserialize, Serialize};

use crate::derive::Derivation;
use crate::matcher::BoundaryRule;

/// Engine settings, read from the optional `settings` block of a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub boundary: BoundaryRule,

    #[serde(default)]
    pub derivation: Derivation,

    /// Glob patterns, matched against paths relative to each directory target.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// File extensions picked up during directory traversal. `"*"` accepts any file.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            boundary: BoundaryRule::default(),
            derivation: Derivation::default(),
            exclude: Vec::new(),
            extensions: default_extensions(),
            jobs: default_jobs(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_extensions() -> Vec<String> {
    [
        "rs", "php", "js", "jsx", "ts", "tsx", "mjs", "json", "toml", "yaml", "yml", "md", "txt",
        "sh", "bash", "py", "rb", "go", "swift", "sql", "html", "css",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_jobs() -> usize {
    1
}
