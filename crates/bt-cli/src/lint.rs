use std::collections::BTreeMap;
use std::io::{self, Write};

use bt_api::compile_sources;
use bt_core::{BtError, CommandKind, CompiledDocument};
use bt_runtime::expr::{parse_expression, parse_statements};

use crate::{output_failed, read_dialogue_files, resolve_dialogue_dir, LintArgs};

pub(crate) fn run_lint(args: LintArgs) -> Result<i32, BtError> {
    let root = resolve_dialogue_dir(&args.dir)?;
    let sources = read_dialogue_files(&root)?;
    let mut output = io::stdout();
    lint_sources(&sources, &mut output)
}

/// Prints one report block per file. Returns exit code 1 when any file
/// failed to compile or carries an expression that cannot be parsed.
pub(crate) fn lint_sources(
    sources: &BTreeMap<String, String>,
    output: &mut dyn Write,
) -> Result<i32, BtError> {
    let mut failed_files = 0usize;
    let compiled = compile_sources(sources);

    for (path, result) in &compiled {
        let document = match result {
            Ok(document) => document,
            Err(error) => {
                failed_files += 1;
                writeln!(output, "ERROR {}: {}", path, error).map_err(output_failed)?;
                continue;
            }
        };

        for diagnostic in &document.diagnostics {
            writeln!(output, "WARN {}: {}", path, diagnostic).map_err(output_failed)?;
        }
        let expression_errors = check_expressions(document);
        for error in &expression_errors {
            writeln!(
                output,
                "ERROR {}: line {}: {}",
                path,
                error.line_no.unwrap_or_default(),
                error
            )
            .map_err(output_failed)?;
        }
        if !expression_errors.is_empty() {
            failed_files += 1;
        } else if document.diagnostics.is_empty() {
            writeln!(output, "OK {}", path).map_err(output_failed)?;
        }
    }

    writeln!(
        output,
        "SUMMARY files={} failed={}",
        compiled.len(),
        failed_files
    )
    .map_err(output_failed)?;
    Ok(if failed_files == 0 { 0 } else { 1 })
}

fn check_expressions(document: &CompiledDocument) -> Vec<BtError> {
    let mut errors = Vec::new();
    for line in &document.lines {
        for command in &line.commands {
            let checked = match (command.kind, command.parameter.as_deref()) {
                (CommandKind::Set, Some(statement)) => parse_statements(statement).map(|_| ()),
                (CommandKind::If, Some(expression)) => parse_expression(expression).map(|_| ()),
                (CommandKind::Set | CommandKind::If, None) => Err(BtError::new(
                    "EVAL_PARSE",
                    format!("`{}` has nothing to evaluate", command.kind.as_word()),
                )),
                _ => Ok(()),
            };
            if let Err(error) = checked {
                errors.push(BtError::at_line(error.code, error.message, line.line_no));
            }
        }
    }
    errors
}
