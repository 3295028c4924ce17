use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bt_compiler::compile_document;
use bt_core::{BtError, CompiledDocument, Diagnostic, Line, LineId, Next, StateData};

use crate::choices::{
    compute_choices_with_diagnostics, ChoiceResolution, DEFAULT_MAX_RESOLUTION_DEPTH,
};
use crate::state::StateStore;

pub trait SourceReader {
    fn read(&self, path: &str) -> Result<String, BtError>;
}

impl<F> SourceReader for F
where
    F: Fn(&str) -> Result<String, BtError>,
{
    fn read(&self, path: &str) -> Result<String, BtError> {
        self(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub track_line_visits: bool,
    pub max_resolution_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            track_line_visits: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

/// Issued by `begin_load`; a completion carrying an older generation is
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub path: String,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cursor {
    Entry,
    Line(LineId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub file: String,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub file: String,
    pub line: LineId,
}

#[derive(Debug, Default)]
pub struct Session {
    pub(crate) options: SessionOptions,
    pub(crate) state: StateStore,
    pub(crate) documents: BTreeMap<String, CompiledDocument>,
    pub(crate) position: Option<Position>,
    pub(crate) call_stack: Vec<Position>,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) pending_call: Option<String>,
    choices: Option<Result<ChoiceResolution, BtError>>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn reset(&mut self) {
        self.state.clear();
        self.documents.clear();
        self.position = None;
        self.call_stack.clear();
        self.history.clear();
        self.pending_call = None;
        self.choices = None;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "session reset");
    }

    pub fn begin_load(&mut self, path: impl Into<String>) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            path: path.into(),
            generation: self.generation,
        }
    }

    /// Compiles `content` as a fresh start. Returns `Ok(false)` when the
    /// ticket went stale in the meantime.
    pub fn finish_start(&mut self, ticket: LoadTicket, content: &str) -> Result<bool, BtError> {
        if self.is_stale(&ticket) {
            return Ok(false);
        }
        let document = compile_document(content)?;
        self.documents.insert(ticket.path.clone(), document);
        self.call_stack.clear();
        self.history.clear();
        self.pending_call = None;
        self.position = Some(Position {
            file: ticket.path,
            cursor: Cursor::Entry,
        });
        self.recompute();
        Ok(true)
    }

    pub fn finish_push(&mut self, ticket: LoadTicket, content: &str) -> Result<bool, BtError> {
        if self.is_stale(&ticket) {
            return Ok(false);
        }
        let Some(caller) = self.position.clone() else {
            return Err(not_started());
        };
        let document = compile_document(content)?;
        self.documents.insert(ticket.path.clone(), document);
        self.call_stack.push(caller);
        self.pending_call = None;
        self.position = Some(Position {
            file: ticket.path,
            cursor: Cursor::Entry,
        });
        self.recompute();
        Ok(true)
    }

    pub fn start_file(&mut self, path: &str, reader: &dyn SourceReader) -> Result<(), BtError> {
        let ticket = self.begin_load(path);
        let content = reader.read(path)?;
        self.finish_start(ticket, &content).map(|_| ())
    }

    pub fn push_file(&mut self, path: &str, reader: &dyn SourceReader) -> Result<(), BtError> {
        let ticket = self.begin_load(path);
        let content = reader.read(path)?;
        self.finish_push(ticket, &content).map(|_| ())
    }

    pub fn get_choices(&self) -> Result<&[Next], BtError> {
        match &self.choices {
            None => Err(not_started()),
            Some(Ok(resolution)) => Ok(&resolution.choices),
            Some(Err(error)) => Err(error.clone()),
        }
    }

    pub fn resolution_diagnostics(&self) -> &[Diagnostic] {
        match &self.choices {
            Some(Ok(resolution)) => &resolution.diagnostics,
            _ => &[],
        }
    }

    /// Moves to `next.destination`. Effects run against a copy of the state;
    /// nothing changes unless all of them succeed.
    pub fn push_next(&mut self, next: &Next) -> Result<(), BtError> {
        let Some(position) = &self.position else {
            return Err(not_started());
        };
        if let Some(target) = &self.pending_call {
            return Err(BtError::new(
                "SESSION_CALL_PENDING",
                format!("Call to \"{}\" must be pushed before choosing.", target),
            ));
        }
        let document = self.documents.get(&position.file).ok_or_else(|| {
            BtError::new(
                "SESSION_FILE_UNKNOWN",
                format!("File \"{}\" is not loaded.", position.file),
            )
        })?;
        let line = document.line(next.destination).ok_or_else(|| {
            BtError::new(
                "SESSION_LINE_UNKNOWN",
                format!(
                    "Line {} does not exist in \"{}\".",
                    next.destination, position.file
                ),
            )
        })?;

        let mut staged = self.state.clone();
        for effect in &next.effects {
            staged
                .run_effect(effect)
                .map_err(|error| BtError::at_line(error.code, error.message, line.line_no))?;
        }
        if self.options.track_line_visits {
            if let Some(id) = line.id() {
                staged.mark_visited(id);
            }
        }
        let call_target = line.call_target().map(str::to_string);
        let file = position.file.clone();

        self.state = staged;
        self.history.push(HistoryEntry {
            file: file.clone(),
            line: next.destination,
        });
        self.position = Some(Position {
            file,
            cursor: Cursor::Line(next.destination),
        });
        if let Some(target) = call_target {
            tracing::debug!(target = %target, "call pending");
            self.pending_call = Some(target);
        }
        self.recompute();
        Ok(())
    }

    pub fn current_line(&self) -> Option<&Line> {
        let position = self.position.as_ref()?;
        let document = self.documents.get(&position.file)?;
        match position.cursor {
            Cursor::Entry => Some(&document.entry),
            Cursor::Line(id) => document.line(id),
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn history_lines(&self) -> Vec<&Line> {
        self.history
            .iter()
            .filter_map(|entry| {
                self.documents
                    .get(&entry.file)
                    .and_then(|document| document.line(entry.line))
            })
            .collect()
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn state_snapshot(&self) -> StateData {
        self.state.data().clone()
    }

    pub fn pending_call(&self) -> Option<&str> {
        self.pending_call.as_deref()
    }

    pub fn document(&self, path: &str) -> Option<&CompiledDocument> {
        self.documents.get(path)
    }

    pub fn active_document(&self) -> Option<&CompiledDocument> {
        self.documents.get(&self.position.as_ref()?.file)
    }

    pub fn is_finished(&self) -> bool {
        self.pending_call.is_none()
            && matches!(&self.choices, Some(Ok(resolution)) if resolution.choices.is_empty())
    }

    fn is_stale(&self, ticket: &LoadTicket) -> bool {
        let stale = ticket.generation != self.generation;
        if stale {
            tracing::debug!(
                path = %ticket.path,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale load"
            );
        }
        stale
    }

    // a called file that runs dry returns to its caller
    pub(crate) fn recompute(&mut self) {
        loop {
            if self.pending_call.is_some() {
                self.choices = Some(Ok(ChoiceResolution::default()));
                return;
            }
            let result = match self.current_line() {
                Some(line) => {
                    let Some(document) = self.active_document() else {
                        return;
                    };
                    compute_choices_with_diagnostics(
                        document,
                        line,
                        &self.state,
                        self.options.max_resolution_depth,
                    )
                }
                None => Err(BtError::new(
                    "SESSION_POSITION_INVALID",
                    "Current position does not name a loaded line.",
                )),
            };

            let exhausted = matches!(&result, Ok(resolution) if resolution.choices.is_empty());
            if exhausted {
                if let Some(caller) = self.call_stack.pop() {
                    tracing::debug!(file = %caller.file, "returning from call");
                    self.position = Some(caller);
                    continue;
                }
            }
            self.choices = Some(result);
            return;
        }
    }
}

fn not_started() -> BtError {
    BtError::new("SESSION_NOT_STARTED", "No file has been started.")
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use bt_core::BtValue;
    use pretty_assertions::assert_eq;

    fn reader_of(files: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, BtError> {
        let files = files
            .iter()
            .map(|(path, source)| (path.to_string(), source.to_string()))
            .collect::<BTreeMap<_, _>>();
        move |path: &str| {
            files.get(path).cloned().ok_or_else(|| {
                BtError::new("SOURCE_NOT_FOUND", format!("missing \"{}\"", path))
            })
        }
    }

    fn choice_texts(session: &Session) -> Vec<String> {
        let document = session.active_document().expect("document should be loaded");
        session
            .get_choices()
            .expect("choices should resolve")
            .iter()
            .map(|next| document[next.destination].text.clone())
            .collect()
    }

    fn choose(session: &mut Session, text: &str) {
        let document = session.active_document().expect("document should be loaded");
        let next = session
            .get_choices()
            .expect("choices should resolve")
            .iter()
            .find(|next| document[next.destination].text == text)
            .cloned()
            .expect("choice should be offered");
        session.push_next(&next).expect("push should pass");
    }

    const GREETING: &str = "\
* [[Ann]]: Hello `choice`
  * `option` Hi! `next b2`
  * `skip` `set x=1`
    * Bye. `id b2`
";

    #[test]
    fn walks_the_greeting_end_to_end() {
        let reader = reader_of(&[("greeting.md", GREETING)]);
        let mut session = Session::new();
        session
            .start_file("greeting.md", &reader)
            .expect("start should pass");
        assert_eq!(choice_texts(&session), vec!["Hello"]);

        choose(&mut session, "Hello");
        assert_eq!(choice_texts(&session), vec!["Hi!", "Bye."]);

        choose(&mut session, "Bye.");
        assert_eq!(session.state().get("x"), Some(&BtValue::Number(1.0)));
        assert_eq!(session.state().get("line.b2"), Some(&BtValue::Bool(true)));
        assert_eq!(
            session.state().get("line.b2.visits"),
            Some(&BtValue::Number(1.0))
        );
        assert!(session.is_finished());
        let transcript = session
            .history_lines()
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>();
        assert_eq!(transcript, vec!["Ann: Hello", "Bye."]);
    }

    #[test]
    fn option_path_reaches_the_same_line_without_effect() {
        let reader = reader_of(&[("greeting.md", GREETING)]);
        let mut session = Session::new();
        session
            .start_file("greeting.md", &reader)
            .expect("start should pass");
        choose(&mut session, "Hello");
        choose(&mut session, "Hi!");
        assert_eq!(choice_texts(&session), vec!["Bye."]);
        choose(&mut session, "Bye.");
        assert_eq!(session.state().get("x"), None);
    }

    #[test]
    fn failed_effect_leaves_session_untouched() {
        let reader = reader_of(&[("a.md", "* Start `choice`\n  * Go `set gold = gold - 1`\n")]);
        let mut session = Session::new();
        session.start_file("a.md", &reader).expect("start should pass");
        choose(&mut session, "Start");
        let before = session.state_snapshot();
        let go = session.get_choices().expect("choices")[0].clone();

        let error = session.push_next(&go).expect_err("null arithmetic should fail");
        assert_eq!(error.code, "EVAL_TYPE_MISMATCH");
        assert_eq!(error.line_no, Some(2));
        assert_eq!(session.state_snapshot(), before);
        assert_eq!(session.history().len(), 1);
        assert_eq!(choice_texts(&session), vec!["Go"]);
    }

    #[test]
    fn evaluation_errors_surface_from_get_choices() {
        let reader = reader_of(&[("a.md", "* Start\n* Broken `if (`\n")]);
        let mut session = Session::new();
        session.start_file("a.md", &reader).expect("start should pass");
        choose(&mut session, "Start");
        let error = session.get_choices().expect_err("condition should fail");
        assert_eq!(error.code, "EVAL_PARSE");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn empty_document_fails_to_start() {
        let reader = reader_of(&[("empty.md", "# Title\n\nprose only\n")]);
        let mut session = Session::new();
        let error = session
            .start_file("empty.md", &reader)
            .expect_err("empty file should fail");
        assert_eq!(error.code, "DOCUMENT_EMPTY");
        assert_eq!(
            session.get_choices().expect_err("not started").code,
            "SESSION_NOT_STARTED"
        );
    }

    #[test]
    fn visits_can_be_disabled() {
        let reader = reader_of(&[("a.md", "* Hi `id hi`\n")]);
        let mut session = Session::with_options(SessionOptions {
            track_line_visits: false,
            ..SessionOptions::default()
        });
        session.start_file("a.md", &reader).expect("start should pass");
        choose(&mut session, "Hi");
        assert!(session.state_snapshot().is_empty());
    }

    #[test]
    fn revisits_count_up() {
        let reader = reader_of(&[(
            "loop.md",
            "* `choice`\n  * Knock `id knock` `repeat`\n  * Leave `if line.knock.visits >= 2`\n",
        )]);
        let mut session = Session::new();
        session.start_file("loop.md", &reader).expect("start should pass");
        assert_eq!(choice_texts(&session), vec!["Knock"]);
        choose(&mut session, "Knock");
        assert_eq!(choice_texts(&session), vec!["Knock"]);
        choose(&mut session, "Knock");
        assert_eq!(choice_texts(&session), vec!["Knock", "Leave"]);
        assert_eq!(
            session.state().get("line.knock.visits"),
            Some(&BtValue::Number(2.0))
        );
    }

    #[test]
    fn call_pushes_and_returns_to_caller() {
        let reader = reader_of(&[
            ("main.md", "* Enter `call`[[side.md]]\n* Back home\n"),
            ("side.md", "* Side one\n* Side two `end`\n* Unreached\n"),
        ]);
        let mut session = Session::new();
        session.start_file("main.md", &reader).expect("start should pass");
        choose(&mut session, "Enter");
        assert_eq!(session.pending_call(), Some("side.md"));
        assert!(session.get_choices().expect("choices").is_empty());
        assert!(!session.is_finished());

        session.push_file("side.md", &reader).expect("push should pass");
        assert_eq!(session.call_depth(), 1);
        assert_eq!(choice_texts(&session), vec!["Side one"]);
        choose(&mut session, "Side one");
        choose(&mut session, "Side two");

        assert_eq!(session.call_depth(), 0);
        assert_eq!(session.position().map(|p| p.file.as_str()), Some("main.md"));
        assert_eq!(choice_texts(&session), vec!["Back home"]);
    }

    #[test]
    fn push_next_is_refused_while_a_call_is_pending() {
        let reader = reader_of(&[("main.md", "* Enter `call`[[side.md]]\n* Back\n")]);
        let mut session = Session::new();
        session.start_file("main.md", &reader).expect("start should pass");
        let enter = session.get_choices().expect("choices")[0].clone();
        session.push_next(&enter).expect("push should pass");
        let error = session.push_next(&enter).expect_err("call is pending");
        assert_eq!(error.code, "SESSION_CALL_PENDING");
    }

    #[test]
    fn stale_loads_are_discarded() {
        let mut session = Session::new();
        let first = session.begin_load("a.md");
        let second = session.begin_load("b.md");
        assert!(!session
            .finish_start(first, "* From a\n")
            .expect("stale load is not an error"));
        assert!(session
            .finish_start(second, "* From b\n")
            .expect("load should pass"));
        assert_eq!(choice_texts(&session), vec!["From b"]);

        let third = session.begin_load("c.md");
        session.reset();
        assert!(!session
            .finish_start(third, "* From c\n")
            .expect("stale load is not an error"));
        assert!(session.current_line().is_none());
    }

    #[test]
    fn unknown_destination_is_rejected() {
        let reader = reader_of(&[("a.md", "* Only\n")]);
        let mut session = Session::new();
        session.start_file("a.md", &reader).expect("start should pass");
        let mut next = session.get_choices().expect("choices")[0].clone();
        next.destination = LineId(42);
        let error = session.push_next(&next).expect_err("line does not exist");
        assert_eq!(error.code, "SESSION_LINE_UNKNOWN");
    }
}
