use std::io::{self, BufRead, Write};

use bt_core::BtError;
use bt_runtime::{Session, SourceReader};

use crate::{
    output_failed, resolve_source_file, run_to_boundary, BoundaryEvent, FsSourceReader,
    PlayArgs, PlayCommandAction,
};

const HELP: &str = "commands: :help :state :restart :quit";

pub(crate) fn run_play(args: PlayArgs) -> Result<i32, BtError> {
    let source = resolve_source_file(&args.file)?;
    let reader = FsSourceReader::new(&source.root_dir);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_play_with_io(&source.entry_file, &reader, &mut input, &mut output)
}

pub(crate) fn run_play_with_io(
    entry_file: &str,
    reader: &dyn SourceReader,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<i32, BtError> {
    let mut session = Session::new();
    session.start_file(entry_file, reader)?;
    writeln!(output, "{}", HELP).map_err(output_failed)?;

    loop {
        let boundary = run_to_boundary(&mut session, reader)?;
        for call in &boundary.calls {
            writeln!(output, "-> {}", call).map_err(output_failed)?;
        }
        if let Some(line) = &boundary.line {
            let shown = match &line.speaker {
                Some(speaker) => format!("{}: {}", speaker, line.text),
                None => line.text.clone(),
            };
            writeln!(output).map_err(output_failed)?;
            writeln!(output, "{}", shown).map_err(output_failed)?;
        }
        if boundary.event == BoundaryEvent::End {
            writeln!(output).map_err(output_failed)?;
            writeln!(output, "[END]").map_err(output_failed)?;
            return Ok(0);
        }
        for (index, text) in &boundary.choices {
            writeln!(output, "  [{}] {}", index, text).map_err(output_failed)?;
        }

        loop {
            let Some(raw) = prompt_input_from("> ", input, output)? else {
                return Ok(0);
            };
            match handle_play_command(raw.trim(), entry_file, reader, &mut session, output)? {
                PlayCommandAction::Continue => continue,
                PlayCommandAction::RefreshBoundary => break,
                PlayCommandAction::Quit => return Ok(0),
                PlayCommandAction::NotHandled => {}
            }

            let selected = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| session.get_choices().ok()?.get(index).cloned());
            let Some(next) = selected else {
                writeln!(output, "unknown choice: {}", raw.trim()).map_err(output_failed)?;
                continue;
            };
            match session.push_next(&next) {
                Ok(()) => break,
                Err(error) => {
                    writeln!(output, "error: {}", error).map_err(output_failed)?;
                }
            }
        }
    }
}

pub(crate) fn handle_play_command(
    raw: &str,
    entry_file: &str,
    reader: &dyn SourceReader,
    session: &mut Session,
    output: &mut dyn Write,
) -> Result<PlayCommandAction, BtError> {
    match raw {
        ":help" => {
            writeln!(output, "{}", HELP).map_err(output_failed)?;
            Ok(PlayCommandAction::Continue)
        }
        ":state" => {
            let state = serde_json::to_string_pretty(&session.state_snapshot())
                .map_err(|error| BtError::new("CLI_STATE_INVALID", error.to_string()))?;
            writeln!(output, "{}", state).map_err(output_failed)?;
            Ok(PlayCommandAction::Continue)
        }
        ":restart" => {
            session.reset();
            session.start_file(entry_file, reader)?;
            writeln!(output, "restarted").map_err(output_failed)?;
            Ok(PlayCommandAction::RefreshBoundary)
        }
        ":quit" => {
            writeln!(output, "bye").map_err(output_failed)?;
            Ok(PlayCommandAction::Quit)
        }
        _ => Ok(PlayCommandAction::NotHandled),
    }
}

/// `None` once input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, BtError> {
    write!(writer, "{}", prefix).map_err(output_failed)?;
    writer.flush().map_err(output_failed)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(output_failed)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

#[cfg(test)]
mod line_play_tests {
    use super::*;
    use bt_api::MemorySourceReader;

    fn play(source: &str, input: &str) -> (i32, String) {
        let mut reader = MemorySourceReader::default();
        reader.insert("main.md", source);
        let mut input = io::Cursor::new(input.as_bytes().to_vec());
        let mut output = Vec::new();
        let code = run_play_with_io("main.md", &reader, &mut input, &mut output)
            .expect("play should pass");
        (code, String::from_utf8(output).expect("utf8 output"))
    }

    const STORY: &str = "\
* [[Ann]]: Coffee? `choice`
  * Yes please `set coffee = true`
  * No thanks
* Done.
";

    #[test]
    fn plays_through_to_the_end() {
        let (code, output) = play(STORY, "0\n0\n0\n");
        assert_eq!(code, 0);
        assert!(output.contains("  [0] Ann: Coffee?"));
        assert!(output.contains("  [1] No thanks"));
        assert!(output.contains("Yes please"));
        assert!(output.ends_with("[END]\n"));
    }

    #[test]
    fn state_command_prints_the_record() {
        let (_, output) = play(STORY, "0\n0\n:state\n:quit\n");
        assert!(output.contains("\"coffee\": true"));
        assert!(output.contains("bye"));
    }

    #[test]
    fn bad_input_reprompts() {
        let (code, output) = play(STORY, "7\nabc\n");
        assert_eq!(code, 0);
        assert!(output.contains("unknown choice: 7"));
        assert!(output.contains("unknown choice: abc"));
    }

    #[test]
    fn restart_goes_back_to_the_first_line() {
        let (_, output) = play(STORY, "0\n:restart\n:quit\n");
        assert!(output.contains("restarted"));
        assert_eq!(output.matches("  [0] Ann: Coffee?").count(), 2);
    }
}
