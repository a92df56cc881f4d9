use clap::Args;
use std::path::{Path, PathBuf};

use shorthand::schema::{self, DEFAULT_SCHEMA_FILES};
use shorthand::{BoundaryRule, Error, NameMap, Schema};

pub mod map;
pub mod rewrite;

pub type CmdResult<T> = shorthand::Result<(T, i32)>;

/// Schema selection shared by every command.
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {
    /// Schema file (default: shorthand.json, .toml, .yaml or .yml in the current directory)
    #[arg(long, value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Boundary rule override: identifier or alphanumeric
    #[arg(long)]
    pub boundary: Option<String>,
}

/// A schema together with the map built from it.
pub(crate) struct LoadedMap {
    pub path: PathBuf,
    pub schema: Schema,
    pub map: NameMap,
}

/// Load the schema, apply CLI overrides and build the map.
///
/// Any failure here happens before a single target file is touched.
pub(crate) fn load_map(args: &SchemaArgs) -> shorthand::Result<LoadedMap> {
    let path = match &args.schema {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().map_err(|e| {
                Error::internal_io(e.to_string(), Some("resolve current directory".to_string()))
            })?;
            find_schema(&cwd)?
        }
    };

    let mut schema = schema::load(&path)?;
    if let Some(boundary) = &args.boundary {
        schema.settings.boundary = BoundaryRule::from_str(boundary)?;
    }

    let map = NameMap::from_schema(&schema)?;
    shorthand::log_status!(
        "schema",
        "Loaded {} entries from {}",
        map.len(),
        path.display()
    );

    Ok(LoadedMap { path, schema, map })
}

fn find_schema(dir: &Path) -> shorthand::Result<PathBuf> {
    schema::find_default(dir).ok_or_else(|| {
        Error::validation_invalid_argument(
            "schema",
            format!("No schema file found in {}", dir.display()),
            Some(DEFAULT_SCHEMA_FILES.iter().map(|s| s.to_string()).collect()),
        )
        .with_hint("Pass --schema <PATH> or create shorthand.json")
    })
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run_json($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (shorthand::Result<serde_json::Value>, i32) {
    crate::tty::status("shorthand is working...");

    match command {
        crate::Commands::Rewrite(args) => dispatch!(args, rewrite),
        crate::Commands::Map(args) => dispatch!(args, map),
    }
}
