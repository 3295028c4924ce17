use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    ParseAmbiguity,
    UnresolvedReference,
    RepeatOutsideChoice,
    UnknownCommand,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::ParseAmbiguity => "PARSE_AMBIGUITY",
            Self::UnresolvedReference => "UNRESOLVED_REFERENCE",
            Self::RepeatOutsideChoice => "REPEAT_OUTSIDE_CHOICE",
            Self::UnknownCommand => "UNKNOWN_COMMAND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line_no: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_no {
            Some(line_no) => write!(f, "line {}: {}: {}", line_no, self.kind.code(), self.message),
            None => write!(f, "{}: {}", self.kind.code(), self.message),
        }
    }
}

/// Collector that logs each diagnostic as it is recorded.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        line_no: Option<usize>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            line_no,
        };
        tracing::warn!(
            code = kind.code(),
            line_no = ?diagnostic.line_no,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
