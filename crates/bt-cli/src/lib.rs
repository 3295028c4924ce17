use std::ffi::OsString;

use bt_core::BtError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod agent;
mod boundary_runner;
mod cli_args;
mod ids;
mod line_play;
mod lint;
mod models;
mod report;
mod source_loader;

pub(crate) use boundary_runner::{emit_boundary, run_to_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, IdsArgs, LintArgs, Mode, PlayArgs, StartArgs,
};
pub(crate) use models::{BoundaryEvent, BoundaryResult, LineView, PlayCommandAction, PlayerState};
pub(crate) use report::{emit_error, output_failed, CliFailure};
pub(crate) use source_loader::{
    read_dialogue_files, resolve_call_target, resolve_dialogue_dir, resolve_source_file,
    FsSourceReader,
};

/// Environment variable holding the log filter, e.g. `BT_LOG=debug`.
pub const LOG_ENV: &str = "BT_LOG";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, BtError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => line_play::run_play(args),
        Mode::Lint(args) => lint::run_lint(args),
        Mode::Ids(args) => ids::run_ids(args),
    }
}

#[cfg(test)]
mod cli_test_support;
