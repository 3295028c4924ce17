use bt_core::{DiagnosticKind, Diagnostics, Line};

use crate::line::scan_line;

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub lines: Vec<Line>,
    pub diagnostics: Diagnostics,
}

/// Parses every dialogue line of a file in document order, skipping
/// anything that is not a bullet line.
pub fn parse_document(source: &str) -> ParsedDocument {
    let mut parsed = ParsedDocument::default();

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let raw = if index == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };

        let Some(scanned) = scan_line(raw) else {
            continue;
        };

        for word in scanned.unknown_words {
            parsed.diagnostics.record(
                DiagnosticKind::UnknownCommand,
                format!("unknown command word \"{}\"", word),
                Some(line_no),
            );
        }

        let mut line = scanned.line;
        line.line_no = line_no;
        parsed.lines.push(line);
    }

    parsed
}
