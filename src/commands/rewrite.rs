use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use shorthand::local_files;
use shorthand::run::{self, CancelToken, RunOptions};
use shorthand::walker::WalkRules;
use shorthand::{Direction, Error, RunResult, RunStatus};

use super::{load_map, CmdResult, SchemaArgs};

/// Exit code when some files failed and the rest were processed.
const EXIT_PARTIAL_FAILURE: i32 = 3;
/// Exit code after Ctrl-C (128 + SIGINT).
const EXIT_CANCELLED: i32 = 130;

#[derive(Args)]
pub struct RewriteArgs {
    /// Files or directories to rewrite
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Keep a timestamped copy of each file before rewriting it
    #[arg(long)]
    pub backup: bool,

    /// Rewrite short codes back to canonical names
    #[arg(long)]
    pub reverse: bool,

    /// Additional glob pattern to exclude (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Worker threads (default: schema setting, 1 if unset)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteOutput {
    pub command: &'static str,
    pub schema: PathBuf,
    pub direction: Direction,
    pub status: RunStatus,
    #[serde(flatten)]
    pub result: RunResult,
}

pub fn run_json(args: RewriteArgs) -> CmdResult<RewriteOutput> {
    let loaded = load_map(&args.schema)?;

    let jobs = args.jobs.unwrap_or(loaded.schema.settings.jobs);
    if jobs == 0 {
        return Err(Error::validation_invalid_argument(
            "jobs",
            "must be at least 1",
            None,
        ));
    }

    let mut rules = WalkRules::from_settings(&loaded.schema.settings);
    rules.exclude.extend(args.exclude);
    rules.protect(&loaded.path);

    let options = RunOptions {
        targets: args.targets,
        dry_run: args.dry_run,
        backup: args.backup,
        direction: if args.reverse {
            Direction::ToCanonical
        } else {
            Direction::ToShort
        },
        jobs,
        rules,
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        shorthand::log_status!("rewrite", "Ctrl-C handler not installed: {}", e);
    }

    let result = run::run_with_cancel(&options, &loaded.map, &local_files::local(), &cancel);
    let status = result.status();

    Ok((
        RewriteOutput {
            command: "rewrite",
            schema: loaded.path,
            direction: options.direction,
            status,
            result,
        },
        exit_code_for_status(status),
    ))
}

fn exit_code_for_status(status: RunStatus) -> i32 {
    match status {
        RunStatus::Success => 0,
        RunStatus::PartialFailure => EXIT_PARTIAL_FAILURE,
        RunStatus::Cancelled => EXIT_CANCELLED,
    }
}
