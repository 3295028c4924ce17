
use std::collections::HashSet;

use bt_core::{
    BtError, CommandKind, CompiledDocument, Diagnostic, DiagnosticKind, Diagnostics, Line, LineId,
    Next,
};

use crate::state::StateStore;

pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 256;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceResolution {
    pub choices: Vec<Next>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compute_choices(
    document: &CompiledDocument,
    current: &Line,
    state: &StateStore,
) -> Result<Vec<Next>, BtError> {
    compute_choices_with_diagnostics(document, current, state, DEFAULT_MAX_RESOLUTION_DEPTH)
        .map(|resolution| resolution.choices)
}

pub fn compute_choices_with_diagnostics(
    document: &CompiledDocument,
    current: &Line,
    state: &StateStore,
    max_depth: usize,
) -> Result<ChoiceResolution, BtError> {
    if current.is_end() {
        return Ok(ChoiceResolution::default());
    }

    let mut resolver = Resolver {
        document,
        state,
        max_depth: max_depth.max(depth_floor(document)),
        visited: HashSet::new(),
        expanding: HashSet::new(),
        diagnostics: Diagnostics::default(),
    };
    let mut choices = Vec::new();
    for next in &current.nexts {
        choices.extend(resolver.resolve(*next, None, 0)?);
    }

    Ok(ChoiceResolution {
        choices,
        diagnostics: resolver.diagnostics.into_vec(),
    })
}

// Each recursion step enters a transparent line not yet on the path, a content
// line not yet visited, or the `else` successor of a failed `if`, so an acyclic
// path never exceeds twice the line count.
fn depth_floor(document: &CompiledDocument) -> usize {
    2 * document.lines.len() + 2
}

struct Resolver<'a> {
    document: &'a CompiledDocument,
    state: &'a StateStore,
    max_depth: usize,
    // content lines already offered in this pass
    visited: HashSet<LineId>,
    // transparent lines on the current recursion path
    expanding: HashSet<LineId>,
    diagnostics: Diagnostics,
}

impl Resolver<'_> {
    // A line whose conditions hold is transparent only when empty or `skip`;
    // an `if` line carrying text is offered like any other content line.
    fn resolve(
        &mut self,
        id: LineId,
        accumulated: Option<&Next>,
        depth: usize,
    ) -> Result<Vec<Next>, BtError> {
        if depth > self.max_depth {
            return Err(BtError::at_line(
                "RESOLVE_DEPTH_EXCEEDED",
                format!(
                    "Choice resolution went deeper than {} lines.",
                    self.max_depth
                ),
                self.document[id].line_no,
            ));
        }

        let document = self.document;
        let line = &document[id];

        if !self.conditions_hold(line)? {
            return match line.successor {
                Some(successor) if document[successor].is_else() => {
                    self.resolve(successor, accumulated, depth + 1)
                }
                _ => Ok(Vec::new()),
            };
        }

        let candidate = match accumulated {
            Some(accumulated) => accumulated.extended(id, line),
            None => Next::new(id, line),
        };

        if line.is_transparent() {
            if !self.expanding.insert(id) {
                self.diagnostics.record(
                    DiagnosticKind::ParseAmbiguity,
                    format!("transparent line {} loops back onto itself", id),
                    Some(line.line_no),
                );
                return Ok(Vec::new());
            }
            let mut result = Vec::new();
            for next in &line.nexts {
                match self.resolve(*next, Some(&candidate), depth + 1) {
                    Ok(found) => result.extend(found),
                    Err(error) => {
                        self.expanding.remove(&id);
                        return Err(error);
                    }
                }
            }
            self.expanding.remove(&id);
            return Ok(result);
        }

        if !self.visited.insert(id) {
            self.diagnostics.record(
                DiagnosticKind::ParseAmbiguity,
                format!("line {} is reachable through several paths", id),
                Some(line.line_no),
            );
            return Ok(Vec::new());
        }

        let mut result = vec![candidate];
        if line.is_option() {
            if let Some(after) = document.line_after(id) {
                result.extend(self.resolve(after, None, depth + 1)?);
            }
        }
        Ok(result)
    }

    // every `if` on the line must hold
    fn conditions_hold(&self, line: &Line) -> Result<bool, BtError> {
        for condition in line.commands_of(CommandKind::If) {
            let holds = self.state.test_condition(condition).map_err(|error| {
                BtError::at_line(error.code, error.message, line.line_no)
            })?;
            if !holds {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
