use std::collections::BTreeMap;

use bt_core::{
    BtError, CommandKind, CompiledDocument, DiagnosticKind, Diagnostics, Line, LineId,
};
use bt_parser::{parse_document, ParsedDocument};

mod nexts;
mod relations;

pub use nexts::resolve_nexts;
pub use relations::build_relations;

/// Compiles the raw text of one dialogue file into a navigable graph.
pub fn compile_document(source: &str) -> Result<CompiledDocument, BtError> {
    let ParsedDocument { lines, diagnostics } = parse_document(source);
    compile_lines(lines, diagnostics)
}

/// Builds relations, the id index and next links over already parsed lines.
///
/// Structural anomalies are collected as diagnostics; only a document without
/// any dialogue line fails.
pub fn compile_lines(
    mut lines: Vec<Line>,
    mut diagnostics: Diagnostics,
) -> Result<CompiledDocument, BtError> {
    if lines.is_empty() {
        return Err(BtError::new(
            "DOCUMENT_EMPTY",
            "Parsed file does not have any dialogue lines.",
        ));
    }

    build_relations(&mut lines);
    let ids = collect_ids(&lines, &mut diagnostics);
    check_call_targets(&lines, &mut diagnostics);

    let mut document = CompiledDocument {
        lines,
        entry: Line::sentinel(LineId(0)),
        ids,
        diagnostics: Vec::new(),
    };

    let nexts = resolve_nexts(&document, &mut diagnostics);
    for (line, nexts) in document.lines.iter_mut().zip(nexts) {
        line.nexts = nexts;
    }
    document.diagnostics = diagnostics.into_vec();

    tracing::debug!(
        lines = document.lines.len(),
        ids = document.ids.len(),
        diagnostics = document.diagnostics.len(),
        "compiled dialogue document"
    );
    Ok(document)
}

fn collect_ids(lines: &[Line], diagnostics: &mut Diagnostics) -> BTreeMap<String, LineId> {
    let mut ids = BTreeMap::new();
    for (index, line) in lines.iter().enumerate() {
        let Some(id) = line.id() else {
            continue;
        };
        if let Some(previous) = ids.insert(id.to_string(), LineId(index)) {
            diagnostics.record(
                DiagnosticKind::ParseAmbiguity,
                format!(
                    "duplicate id \"{}\" (also on line {}), last one wins",
                    id, lines[previous.0].line_no
                ),
                Some(line.line_no),
            );
        }
    }
    ids
}

fn check_call_targets(lines: &[Line], diagnostics: &mut Diagnostics) {
    for line in lines {
        if line.has(CommandKind::Call) && line.call_target().is_none() {
            diagnostics.record(
                DiagnosticKind::UnresolvedReference,
                "`call` without a [[target]] link",
                Some(line.line_no),
            );
        }
    }
}
