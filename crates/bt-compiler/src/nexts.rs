use std::collections::HashSet;

use bt_core::{CommandKind, CompiledDocument, DiagnosticKind, Diagnostics, LineId};

/// Computes the structural next candidates of every line.
///
/// Rules, first applicable wins: explicit `next <id>`, `repeat` back to the
/// enclosing `choice`, children (all of them under a `choice`, otherwise the
/// first), and finally whatever follows the line. `else` children of a
/// `choice` are left out: they are entered only when the `if` before them
/// fails.
pub fn resolve_nexts(document: &CompiledDocument, diagnostics: &mut Diagnostics) -> Vec<Vec<LineId>> {
    document
        .line_ids()
        .map(|id| nexts_for(document, id, diagnostics))
        .collect()
}

fn nexts_for(document: &CompiledDocument, id: LineId, diagnostics: &mut Diagnostics) -> Vec<LineId> {
    let line = &document[id];
    let mut nexts = NextCollector::new(line.line_no);

    if line.has(CommandKind::Next) {
        match line.next_target() {
            Some(target) => match document.lookup(target) {
                Some(destination) => nexts.push(destination, diagnostics),
                None => diagnostics.record(
                    DiagnosticKind::UnresolvedReference,
                    format!("did not find id \"{}\" in this file", target),
                    Some(line.line_no),
                ),
            },
            None => diagnostics.record(
                DiagnosticKind::UnresolvedReference,
                "`next` without a target id",
                Some(line.line_no),
            ),
        }
    } else if line.is_repeat() {
        match document.choice_ancestor(id) {
            Some(choice) => nexts.push(choice, diagnostics),
            None => diagnostics.record(
                DiagnosticKind::RepeatOutsideChoice,
                "`repeat` used outside of a `choice` block",
                Some(line.line_no),
            ),
        }
    } else if !line.children.is_empty() {
        if line.is_choice() {
            for child in &line.children {
                if document[*child].is_else() {
                    continue;
                }
                nexts.push(*child, diagnostics);
            }
        } else {
            nexts.push(line.children[0], diagnostics);
        }
    } else if let Some(after) = document.line_after(id) {
        nexts.push(after, diagnostics);
    }

    nexts.finish()
}

/// Admits each destination once, keeping the first occurrence.
struct NextCollector {
    line_no: usize,
    seen: HashSet<LineId>,
    nexts: Vec<LineId>,
}

impl NextCollector {
    fn new(line_no: usize) -> Self {
        Self {
            line_no,
            seen: HashSet::new(),
            nexts: Vec::new(),
        }
    }

    fn push(&mut self, destination: LineId, diagnostics: &mut Diagnostics) {
        if !self.seen.insert(destination) {
            diagnostics.record(
                DiagnosticKind::ParseAmbiguity,
                format!("line {} has several ways of being added", destination),
                Some(self.line_no),
            );
            return;
        }
        self.nexts.push(destination);
    }

    fn finish(self) -> Vec<LineId> {
        self.nexts
    }
}

#[cfg(test)]
mod nexts_tests {
    use super::*;
    use crate::compile_document;
    use pretty_assertions::assert_eq;

    fn nexts_of(document: &CompiledDocument) -> Vec<Vec<usize>> {
        document
            .lines
            .iter()
            .map(|line| line.nexts.iter().map(|id| id.0).collect())
            .collect()
    }

    #[test]
    fn sequential_lines_chain_to_successor() {
        let document = compile_document("* a\n* b\n* c").expect("compile should pass");
        assert_eq!(nexts_of(&document), vec![vec![1], vec![2], vec![]]);
    }

    #[test]
    fn nested_lines_enter_first_child_and_climb_back_out() {
        let document = compile_document(
            "
* a
  * b
  * c
* d
",
        )
        .expect("compile should pass");
        assert_eq!(nexts_of(&document), vec![vec![1], vec![2], vec![3], vec![]]);
    }

    #[test]
    fn choice_offers_every_child_and_branches_merge_after_block() {
        let document = compile_document(
            "
* Pick `choice`
  * one
    * one more
  * two
  * three
* after
",
        )
        .expect("compile should pass");
        assert_eq!(
            nexts_of(&document),
            vec![vec![1, 3, 4], vec![2], vec![5], vec![5], vec![5], vec![]]
        );
    }

    #[test]
    fn explicit_next_wins_over_children() {
        let document = compile_document(
            "
* a `next z`
  * child
* b `id z`
",
        )
        .expect("compile should pass");
        assert_eq!(document[LineId(0)].nexts, vec![LineId(2)]);
        assert!(document.diagnostics.is_empty());
    }

    #[test]
    fn missing_next_target_is_a_warning_with_no_next() {
        let document = compile_document("* a `next nowhere`\n* b").expect("compile should pass");
        assert!(document[LineId(0)].nexts.is_empty());
        assert_eq!(document.diagnostics.len(), 1);
        assert_eq!(
            document.diagnostics[0].kind,
            DiagnosticKind::UnresolvedReference
        );
        assert_eq!(document.diagnostics[0].line_no, Some(1));
    }

    #[test]
    fn repeat_jumps_back_to_choice_ancestor() {
        let document = compile_document(
            "
* `choice`
  * a
    * again `repeat`
  * b
",
        )
        .expect("compile should pass");
        assert_eq!(document[LineId(2)].nexts, vec![LineId(0)]);
    }

    #[test]
    fn repeat_outside_choice_is_non_fatal() {
        let document = compile_document("* a\n  * b `repeat`\n* c").expect("compile should pass");
        assert!(document[LineId(1)].nexts.is_empty());
        assert_eq!(
            document.diagnostics[0].kind,
            DiagnosticKind::RepeatOutsideChoice
        );
        assert_eq!(document[LineId(0)].nexts, vec![LineId(1)]);
    }

    #[test]
    fn if_line_without_children_skips_its_else_sibling() {
        let document = compile_document(
            "
* `if x` yes
* `else` no
* after
",
        )
        .expect("compile should pass");
        assert_eq!(nexts_of(&document), vec![vec![2], vec![2], vec![]]);
    }

    #[test]
    fn choice_fan_out_leaves_out_else_children() {
        let document = compile_document(
            "
* `choice`
  * `if rich` buy
  * `else` beg
  * leave
",
        )
        .expect("compile should pass");
        assert_eq!(document[LineId(0)].nexts, vec![LineId(1), LineId(3)]);
    }
}
