use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::types::{Line, LineId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub lines: Vec<Line>,
    pub entry: Line,
    pub ids: BTreeMap<String, LineId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledDocument {
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id.0)
    }

    pub fn lookup(&self, id: &str) -> Option<LineId> {
        self.ids.get(id).copied()
    }

    pub fn line_ids(&self) -> impl Iterator<Item = LineId> {
        (0..self.lines.len()).map(LineId)
    }

    /// Where control goes once `id` and everything nested below it is done.
    ///
    /// Branches of a `choice` block merge back to whatever follows the whole
    /// block. `else` successors are skipped: they are only entered through a
    /// failed `if`.
    pub fn line_after(&self, id: LineId) -> Option<LineId> {
        let line = &self[id];
        if let Some(parent) = line.parent {
            if self[parent].is_choice() {
                return self.line_after(parent);
            }
        }
        if let Some(successor) = self.successor_skipping_else(id) {
            return Some(successor);
        }
        line.parent.and_then(|parent| self.line_after(parent))
    }

    pub fn choice_ancestor(&self, id: LineId) -> Option<LineId> {
        let mut cursor = self[id].parent;
        while let Some(candidate) = cursor {
            if self[candidate].is_choice() {
                return Some(candidate);
            }
            cursor = self[candidate].parent;
        }
        None
    }

    fn successor_skipping_else(&self, id: LineId) -> Option<LineId> {
        let mut cursor = self[id].successor;
        while let Some(candidate) = cursor {
            if !self[candidate].is_else() {
                return Some(candidate);
            }
            cursor = self[candidate].successor;
        }
        None
    }
}

impl Index<LineId> for CompiledDocument {
    type Output = Line;

    fn index(&self, id: LineId) -> &Line {
        &self.lines[id.0]
    }
}
