use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use bt_compiler::compile_document;
use bt_core::{BtError, CompiledDocument, StateData};

use crate::session::{Cursor, HistoryEntry, Position, Session, SourceReader};
use crate::state::StateStore;

pub const SNAPSHOT_SCHEMA: &str = "session-snapshot.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: String,
    pub position: Position,
    pub call_stack: Vec<Position>,
    pub history: Vec<HistoryEntry>,
    pub state: StateData,
    pub pending_call: Option<String>,
}

impl SessionSnapshot {
    pub fn files(&self) -> BTreeSet<&str> {
        std::iter::once(&self.position)
            .chain(self.call_stack.iter())
            .map(|position| position.file.as_str())
            .chain(self.history.iter().map(|entry| entry.file.as_str()))
            .collect()
    }
}

impl Session {
    pub fn snapshot(&self) -> Result<SessionSnapshot, BtError> {
        let Some(position) = &self.position else {
            return Err(BtError::new(
                "SNAPSHOT_NOT_ALLOWED",
                "snapshot() needs a started session.",
            ));
        };
        Ok(SessionSnapshot {
            schema_version: SNAPSHOT_SCHEMA.to_string(),
            position: position.clone(),
            call_stack: self.call_stack.clone(),
            history: self.history.clone(),
            state: self.state.data().clone(),
            pending_call: self.pending_call.clone(),
        })
    }

    /// Replaces this session with `snapshot`, recompiling every referenced
    /// file through `reader`. On failure the session is left as it was.
    pub fn resume(
        &mut self,
        snapshot: SessionSnapshot,
        reader: &dyn SourceReader,
    ) -> Result<(), BtError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA {
            return Err(BtError::new(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SNAPSHOT_SCHEMA
                ),
            ));
        }

        let mut documents = BTreeMap::new();
        for file in snapshot.files() {
            let source = reader.read(file)?;
            documents.insert(file.to_string(), compile_document(&source)?);
        }

        for position in std::iter::once(&snapshot.position).chain(snapshot.call_stack.iter()) {
            if let Cursor::Line(line) = position.cursor {
                check_line(&documents, &position.file, line)?;
            }
        }
        for entry in &snapshot.history {
            check_line(&documents, &entry.file, entry.line)?;
        }

        self.reset();
        self.documents = documents;
        self.state = StateStore::from_data(snapshot.state);
        self.position = Some(snapshot.position);
        self.call_stack = snapshot.call_stack;
        self.history = snapshot.history;
        self.pending_call = snapshot.pending_call;
        self.recompute();
        Ok(())
    }
}

fn check_line(
    documents: &BTreeMap<String, CompiledDocument>,
    file: &str,
    line: bt_core::LineId,
) -> Result<(), BtError> {
    let known = documents
        .get(file)
        .is_some_and(|document| document.line(line).is_some());
    if known {
        Ok(())
    } else {
        Err(BtError::new(
            "SNAPSHOT_LINE_UNKNOWN",
            format!("Snapshot refers to line {} missing from \"{}\".", line, file),
        ))
    }
}
