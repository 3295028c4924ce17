use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use bt_core::BtError;
use bt_runtime::SourceReader;
use walkdir::WalkDir;

use crate::CliFailure;

const DIALOGUE_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Reads dialogue files relative to a root directory.
#[derive(Debug, Clone)]
pub(crate) struct FsSourceReader {
    root: PathBuf,
}

impl FsSourceReader {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceReader for FsSourceReader {
    fn read(&self, path: &str) -> Result<String, BtError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(BtError::new(
                "CLI_SOURCE_NOT_FOUND",
                format!("dialogue file does not exist: {}", full.display()),
            ));
        }
        tracing::debug!(path = %full.display(), "reading dialogue file");
        fs::read_to_string(&full).map_err(CliFailure::SourceRead.at(&full))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadedSource {
    pub(crate) root_dir: PathBuf,
    pub(crate) entry_file: String,
}

pub(crate) fn resolve_source_file(file: &str) -> Result<LoadedSource, BtError> {
    let absolute = absolutize(file)?;

    if !absolute.exists() {
        return Err(BtError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("file does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_file() {
        return Err(BtError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("file is not a regular file: {}", absolute.display()),
        ));
    }

    let entry_file = absolute
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let root_dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedSource {
        root_dir,
        entry_file,
    })
}

pub(crate) fn resolve_dialogue_dir(dir: &str) -> Result<PathBuf, BtError> {
    let absolute = absolutize(dir)?;

    if !absolute.exists() {
        return Err(BtError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(BtError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Every `.md`/`.txt` file under `dir`, keyed by its `/`-separated relative
/// path.
pub(crate) fn read_dialogue_files(dir: &Path) -> Result<BTreeMap<String, String>, BtError> {
    let mut sources = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_dialogue = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| DIALOGUE_EXTENSIONS.contains(&extension));
        if !is_dialogue {
            continue;
        }

        let relative = path
            .strip_prefix(dir)
            .map_err(CliFailure::SourceScan.at(path))?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(CliFailure::SourceRead.at(path))?;
        sources.insert(relative, content);
    }

    if sources.is_empty() {
        return Err(BtError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .md/.txt files under {}", dir.display()),
        ));
    }

    Ok(sources)
}

/// Resolves a `call` target against the directory of the calling file. Both
/// are `/`-separated keys relative to the reader root.
pub(crate) fn resolve_call_target(calling_file: &str, target: &str) -> String {
    let base = Path::new(calling_file)
        .parent()
        .unwrap_or_else(|| Path::new(""));
    let mut parts: Vec<String> = Vec::new();
    for component in base.join(target).components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            _ => {}
        }
    }
    parts.join("/")
}

fn absolutize(path: &str) -> Result<PathBuf, BtError> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(|error| CliFailure::WorkingDir.wrap(error))?
        .join(path))
}
