// Public modules
pub mod commit;
pub mod defaults;
pub mod derive;
pub mod error;
pub mod local_files;
pub mod matcher;
pub mod name_map;
pub mod output;
pub mod rewriter;
pub mod run;
pub mod schema;
pub mod walker;

// Re-export common types for convenience
pub use defaults::Settings;
pub use error::{Error, ErrorCode, Result};
pub use matcher::{BoundaryRule, Direction};
pub use name_map::{MappedEntry, NameMap};
pub use output::{FileError, FileReport, FileStatus, RunResult, RunStatus};
pub use run::{CancelToken, RunOptions};
pub use schema::{NamingEntry, Schema};
