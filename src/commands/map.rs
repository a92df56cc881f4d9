use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use shorthand::derive::Derivation;
use shorthand::{BoundaryRule, Error, MappedEntry, NameMap};

use super::{load_map, CmdResult, SchemaArgs};

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Resolve a single canonical name, alias or short code
    #[arg(long, value_name = "TOKEN")]
    pub lookup: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOutput {
    pub command: &'static str,
    pub schema: PathBuf,
    pub boundary: BoundaryRule,
    pub derivation: Derivation,
    pub entries: Vec<MappedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Lookup>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lookup {
    pub query: String,
    pub canonical_name: String,
    pub short_code: String,
}

pub fn run_json(args: MapArgs) -> CmdResult<MapOutput> {
    let loaded = load_map(&args.schema)?;

    let lookup = match args.lookup.as_deref() {
        Some(query) => Some(resolve(&loaded.map, query)?),
        None => None,
    };

    Ok((
        MapOutput {
            command: "map",
            schema: loaded.path,
            boundary: loaded.map.boundary(),
            derivation: loaded.schema.settings.derivation,
            entries: loaded.map.entries().to_vec(),
            lookup,
        },
        0,
    ))
}

fn resolve(map: &NameMap, query: &str) -> shorthand::Result<Lookup> {
    if let Some(code) = map.code_for(query) {
        let canonical = map.canonical_for(code).unwrap_or(query);
        return Ok(Lookup {
            query: query.to_string(),
            canonical_name: canonical.to_string(),
            short_code: code.to_string(),
        });
    }
    if let Some(canonical) = map.canonical_for(query) {
        return Ok(Lookup {
            query: query.to_string(),
            canonical_name: canonical.to_string(),
            short_code: query.to_string(),
        });
    }
    Err(Error::validation_invalid_argument(
        "lookup",
        format!("'{}' is not a known name, alias or short code", query),
        None,
    ))
}
