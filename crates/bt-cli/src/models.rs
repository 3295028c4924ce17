use std::fs;
use std::path::Path;

use bt_core::BtError;
use bt_runtime::SessionSnapshot;
use serde::{Deserialize, Serialize};

use crate::CliFailure;

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";

/// Saved between `agent` invocations. File keys inside the snapshot are
/// relative to `root_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) root_dir: String,
    pub(crate) entry_file: String,
    pub(crate) snapshot: SessionSnapshot,
}

impl PlayerState {
    pub(crate) fn new(root_dir: &str, entry_file: &str, snapshot: SessionSnapshot) -> Self {
        Self {
            schema_version: PLAYER_STATE_SCHEMA.to_string(),
            root_dir: root_dir.to_string(),
            entry_file: entry_file.to_string(),
            snapshot,
        }
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), BtError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CliFailure::StateWrite.at(parent))?;
        }
        let payload =
            serde_json::to_string_pretty(self).map_err(CliFailure::StateInvalid.at(path))?;
        fs::write(path, payload).map_err(CliFailure::StateWrite.at(path))
    }

    /// Reads a state file written by an earlier `agent` call. The snapshot
    /// inside is checked later, when the session resumes from it.
    pub(crate) fn load(path: &Path) -> Result<Self, BtError> {
        if !path.is_file() {
            return Err(BtError::new(
                "CLI_STATE_NOT_FOUND",
                format!("State file does not exist: {}", path.display()),
            ));
        }
        let raw = fs::read_to_string(path).map_err(CliFailure::StateRead.at(path))?;
        let state: Self = serde_json::from_str(&raw).map_err(CliFailure::StateInvalid.at(path))?;
        if state.schema_version != PLAYER_STATE_SCHEMA {
            return Err(BtError::new(
                "CLI_STATE_SCHEMA",
                format!(
                    "{} has schema \"{}\", expected \"{}\".",
                    path.display(),
                    state.schema_version,
                    PLAYER_STATE_SCHEMA
                ),
            ));
        }
        Ok(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineView {
    pub(crate) file: String,
    pub(crate) line_no: usize,
    pub(crate) speaker: Option<String>,
    pub(crate) text: String,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) calls: Vec<String>,
    pub(crate) line: Option<LineView>,
    pub(crate) choices: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}
