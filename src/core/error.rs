use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SchemaInvalid,
    SchemaParseFailed,

    MapCollision,

    FileNotFound,
    FileReadFailed,
    FileWriteFailed,
    FileBackupFailed,

    ValidationInvalidArgument,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaInvalid => "schema.invalid",
            ErrorCode::SchemaParseFailed => "schema.parse_failed",

            ErrorCode::MapCollision => "map.collision",

            ErrorCode::FileNotFound => "file.not_found",
            ErrorCode::FileReadFailed => "file.read_failed",
            ErrorCode::FileWriteFailed => "file.write_failed",
            ErrorCode::FileBackupFailed => "file.backup_failed",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Errors raised before any file is touched.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ErrorCode::SchemaInvalid | ErrorCode::SchemaParseFailed | ErrorCode::MapCollision
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInvalidDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub problems: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaParseDetails {
    pub source: String,
    pub format: String,
    pub error: String,
}

/// The two entries involved in a mapping conflict.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionDetails {
    pub code: String,
    pub first: String,
    pub second: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileErrorDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn schema_invalid(source: Option<String>, problems: Vec<String>) -> Self {
        let message = match problems.as_slice() {
            [only] => format!("Invalid schema: {}", only),
            _ => format!("Invalid schema: {} problems found", problems.len()),
        };
        Self::new(
            ErrorCode::SchemaInvalid,
            message,
            to_details(SchemaInvalidDetails { source, problems }),
        )
    }

    pub fn schema_parse(
        source: impl Into<String>,
        format: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let source = source.into();
        Self::new(
            ErrorCode::SchemaParseFailed,
            format!("Could not parse schema '{}'", source),
            to_details(SchemaParseDetails {
                source,
                format: format.into(),
                error: error.into(),
            }),
        )
    }

    /// Two entries resolve to the same short code, or a code shadows a name.
    pub fn map_collision(
        code: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = CollisionDetails {
            code: code.into(),
            first: first.into(),
            second: second.into(),
            problem: problem.into(),
        };
        let message = format!(
            "Short code '{}' conflicts between '{}' and '{}': {}",
            details.code, details.first, details.second, details.problem
        );
        Self::new(ErrorCode::MapCollision, message, to_details(details))
            .with_hint("Give one of the entries an explicit, unique shortCode")
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::FileNotFound,
            format!("Target not found: {}", path),
            to_details(FileErrorDetails {
                path,
                error: "no such file or directory".to_string(),
            }),
        )
    }

    pub fn file_read(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(ErrorCode::FileReadFailed, "Failed to read", path, error)
    }

    pub fn file_write(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(ErrorCode::FileWriteFailed, "Failed to write", path, error)
    }

    pub fn file_backup(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(ErrorCode::FileBackupFailed, "Failed to back up", path, error)
            .with_hint("The file was left untouched because its backup could not be written")
    }

    fn file_error(
        code: ErrorCode,
        verb: &str,
        path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let error = error.into();
        Self::new(
            code,
            format!("{} {}: {}", verb, path, error),
            to_details(FileErrorDetails { path, error }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                tried,
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_names_both_entries() {
        let err = Error::map_collision("NE", "NamingEngine", "NetworkEdge", "declared twice");
        assert_eq!(err.code, ErrorCode::MapCollision);
        assert!(err.message.contains("NamingEngine"));
        assert!(err.message.contains("NetworkEdge"));
        assert_eq!(err.details["first"], "NamingEngine");
        assert_eq!(err.details["second"], "NetworkEdge");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn schema_invalid_summarizes_problem_count() {
        let single = Error::schema_invalid(None, vec!["empty canonicalName".to_string()]);
        assert_eq!(single.message, "Invalid schema: empty canonicalName");

        let many = Error::schema_invalid(
            Some("names.json".to_string()),
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(many.message.contains("2 problems"));
        assert_eq!(many.details["source"], "names.json");
    }

    #[test]
    fn preflight_codes() {
        assert!(ErrorCode::SchemaInvalid.is_preflight());
        assert!(ErrorCode::MapCollision.is_preflight());
        assert!(!ErrorCode::FileWriteFailed.is_preflight());
        assert_eq!(ErrorCode::FileBackupFailed.as_str(), "file.backup_failed");
    }
}
