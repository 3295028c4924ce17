use std::path::Path;

use bt_core::BtError;
use bt_runtime::Session;

use crate::{
    emit_boundary, resolve_source_file, run_to_boundary, AgentArgs, AgentCommand, ChooseArgs,
    FsSourceReader, PlayerState, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, BtError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, BtError> {
    let source = resolve_source_file(&args.file)?;
    let reader = FsSourceReader::new(&source.root_dir);
    let mut session = Session::new();
    session.start_file(&source.entry_file, &reader)?;

    let boundary = run_to_boundary(&mut session, &reader)?;
    save_session_state(
        Path::new(&args.state_out),
        &session,
        &source.root_dir.to_string_lossy(),
        &source.entry_file,
    )?;
    emit_boundary(boundary, Some(args.state_out));
    Ok(0)
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, BtError> {
    let state = PlayerState::load(Path::new(&args.state_in))?;
    let reader = FsSourceReader::new(&state.root_dir);
    let mut session = Session::new();
    session.resume(state.snapshot, &reader)?;

    let next = session
        .get_choices()?
        .get(args.choice)
        .cloned()
        .ok_or_else(|| {
            BtError::new(
                "CLI_CHOICE_INDEX",
                format!("Choice index \"{}\" is out of range.", args.choice),
            )
        })?;
    session.push_next(&next)?;

    let boundary = run_to_boundary(&mut session, &reader)?;
    save_session_state(
        Path::new(&args.state_out),
        &session,
        &state.root_dir,
        &state.entry_file,
    )?;
    emit_boundary(boundary, Some(args.state_out));
    Ok(0)
}

fn save_session_state(
    path: &Path,
    session: &Session,
    root_dir: &str,
    entry_file: &str,
) -> Result<(), BtError> {
    PlayerState::new(root_dir, entry_file, session.snapshot()?).save(path)
}
