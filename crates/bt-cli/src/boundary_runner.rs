use bt_core::BtError;
use bt_runtime::{Session, SourceReader};

use crate::{resolve_call_target, BoundaryEvent, BoundaryResult, LineView};

/// Follows a pending call, then reads the line just reached and the choices
/// offered from there.
pub(crate) fn run_to_boundary(
    session: &mut Session,
    reader: &dyn SourceReader,
) -> Result<BoundaryResult, BtError> {
    let mut calls = Vec::new();

    if let Some(target) = session.pending_call().map(str::to_string) {
        let calling_file = session
            .position()
            .map(|position| position.file.clone())
            .unwrap_or_default();
        let resolved = resolve_call_target(&calling_file, &target);
        session.push_file(&resolved, reader)?;
        calls.push(resolved);
    }

    let line = session.history().last().and_then(|entry| {
        let line = session.document(&entry.file)?.line(entry.line)?;
        Some(LineView {
            file: entry.file.clone(),
            line_no: line.line_no,
            speaker: line.speaker.clone(),
            text: line.text.clone(),
        })
    });

    let choices = match session.active_document() {
        Some(document) => session
            .get_choices()?
            .iter()
            .enumerate()
            .map(|(index, next)| (index, document[next.destination].to_string()))
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    Ok(BoundaryResult {
        event: if choices.is_empty() {
            BoundaryEvent::End
        } else {
            BoundaryEvent::Choices
        },
        calls,
        line,
        choices,
    })
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    for call in boundary.calls {
        println!(
            "CALL_JSON:{}",
            serde_json::to_string(&call).expect("string json")
        );
    }

    if let Some(line) = boundary.line {
        println!(
            "LINE_JSON:{}",
            serde_json::to_string(&line).expect("line view json")
        );
    }

    for (index, text) in boundary.choices {
        println!(
            "CHOICE:{}|{}",
            index,
            serde_json::to_string(&text).expect("string json")
        );
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}
