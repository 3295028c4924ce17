use std::collections::BTreeMap;

use bt_compiler::compile_document;
use bt_core::{BtError, CompiledDocument};
use bt_runtime::{Session, SessionOptions, SessionSnapshot, SourceReader};

/// Sources held in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceReader {
    sources: BTreeMap<String, String>,
}

impl MemorySourceReader {
    pub fn new(sources: BTreeMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }

    pub fn sources(&self) -> &BTreeMap<String, String> {
        &self.sources
    }
}

impl SourceReader for MemorySourceReader {
    fn read(&self, path: &str) -> Result<String, BtError> {
        self.sources.get(path).cloned().ok_or_else(|| {
            BtError::new(
                "SOURCE_NOT_FOUND",
                format!("Source \"{}\" is not registered.", path),
            )
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSessionOptions {
    pub sources: BTreeMap<String, String>,
    pub entry_file: Option<String>,
    pub options: SessionOptions,
}

#[derive(Debug, Clone)]
pub struct ResumeSessionOptions {
    pub sources: BTreeMap<String, String>,
    pub snapshot: SessionSnapshot,
    pub options: SessionOptions,
}

/// Compiles every source independently; one broken file does not hide the
/// others.
pub fn compile_sources(
    sources: &BTreeMap<String, String>,
) -> BTreeMap<String, Result<CompiledDocument, BtError>> {
    sources
        .iter()
        .map(|(path, source)| (path.clone(), compile_document(source)))
        .collect()
}

pub fn create_session(options: CreateSessionOptions) -> Result<Session, BtError> {
    let entry_file = resolve_entry_file(&options.sources, options.entry_file)?;
    let reader = MemorySourceReader::new(options.sources);
    let mut session = Session::with_options(options.options);
    session.start_file(&entry_file, &reader)?;
    Ok(session)
}

pub fn resume_session(options: ResumeSessionOptions) -> Result<Session, BtError> {
    let reader = MemorySourceReader::new(options.sources);
    let mut session = Session::with_options(options.options);
    session.resume(options.snapshot, &reader)?;
    Ok(session)
}

fn resolve_entry_file(
    sources: &BTreeMap<String, String>,
    explicit: Option<String>,
) -> Result<String, BtError> {
    if let Some(entry) = explicit {
        if !sources.contains_key(&entry) {
            return Err(BtError::new(
                "API_ENTRY_FILE_NOT_FOUND",
                format!("Entry file \"{}\" is not registered.", entry),
            ));
        }
        return Ok(entry);
    }

    for candidate in ["main.md", "main.txt"] {
        if sources.contains_key(candidate) {
            return Ok(candidate.to_string());
        }
    }

    Err(BtError::new(
        "API_ENTRY_MAIN_NOT_FOUND",
        "Expected \"main.md\" or \"main.txt\" as default entry.",
    ))
}
