use bt_core::{Line, LineId};

/// Reconstructs parent/children/successor links from indentation in one
/// left-to-right pass.
///
/// The stack holds open scopes with non-decreasing indent. Deeper scopes are
/// closed when a shallower line arrives; an entry at the same indent becomes
/// the predecessor of the current line and is consumed.
pub fn build_relations(lines: &mut [Line]) {
    let mut stack: Vec<LineId> = Vec::new();

    for index in 0..lines.len() {
        let current = LineId(index);
        let indent = lines[index].indent;

        while let Some(top) = stack.last() {
            if lines[top.0].indent <= indent {
                break;
            }
            stack.pop();
        }

        if let Some(&predecessor) = stack.last() {
            if lines[predecessor.0].indent == indent {
                lines[predecessor.0].successor = Some(current);
                stack.pop();
            }
        }

        if let Some(&parent) = stack.last() {
            lines[index].parent = Some(parent);
            lines[parent.0].children.push(current);
        }

        stack.push(current);
    }
}
