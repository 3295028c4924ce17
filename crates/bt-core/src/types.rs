use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Id,
    Next,
    Choice,
    Option,
    Repeat,
    End,
    Call,
    Skip,
    Set,
    If,
    Else,
}

impl CommandKind {
    pub fn from_word(word: &str) -> Option<Self> {
        let kind = match word {
            "id" => Self::Id,
            "next" => Self::Next,
            "choice" => Self::Choice,
            "option" => Self::Option,
            "repeat" => Self::Repeat,
            "end" => Self::End,
            "call" => Self::Call,
            "skip" => Self::Skip,
            "set" => Self::Set,
            "if" => Self::If,
            "else" => Self::Else,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_word(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Next => "next",
            Self::Choice => "choice",
            Self::Option => "option",
            Self::Repeat => "repeat",
            Self::End => "end",
            Self::Call => "call",
            Self::Skip => "skip",
            Self::Set => "set",
            Self::If => "if",
            Self::Else => "else",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub parameter: Option<String>,
}

impl Command {
    pub fn flag(kind: CommandKind) -> Self {
        Self {
            kind,
            parameter: None,
        }
    }

    pub fn with_parameter(kind: CommandKind, parameter: impl Into<String>) -> Self {
        Self {
            kind,
            parameter: Some(parameter.into()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.parameter) {
            (CommandKind::Call, Some(target)) => write!(f, "call[[{}]]", target),
            (kind, Some(parameter)) => write!(f, "{} {}", kind.as_word(), parameter),
            (kind, None) => write!(f, "{}", kind.as_word()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub usize);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One compiled dialogue line.
///
/// `indent`, `speaker`, `text` and `commands` come from the line parser.
/// `parent`, `children` and `successor` are filled in by the relation builder,
/// `nexts` by the next-link resolver. All links are arena indices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub line_no: usize,
    pub indent: usize,
    pub speaker: Option<String>,
    pub text: String,
    pub commands: Vec<Command>,
    pub parent: Option<LineId>,
    pub children: Vec<LineId>,
    pub successor: Option<LineId>,
    pub nexts: Vec<LineId>,
}

impl Line {
    pub fn new(
        indent: usize,
        speaker: Option<String>,
        text: impl Into<String>,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            indent,
            speaker,
            text: text.into(),
            commands,
            ..Self::default()
        }
    }

    pub fn sentinel(first: LineId) -> Self {
        Self {
            nexts: vec![first],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_transparent(&self) -> bool {
        self.is_empty() || self.has(CommandKind::Skip)
    }

    pub fn has(&self, kind: CommandKind) -> bool {
        self.commands.iter().any(|command| command.kind == kind)
    }

    pub fn parameter(&self, kind: CommandKind) -> Option<&str> {
        self.commands
            .iter()
            .find(|command| command.kind == kind)
            .and_then(|command| command.parameter.as_deref())
    }

    pub fn commands_of(&self, kind: CommandKind) -> impl Iterator<Item = &Command> + '_ {
        self.commands
            .iter()
            .filter(move |command| command.kind == kind)
    }

    pub fn id(&self) -> Option<&str> {
        self.parameter(CommandKind::Id)
    }

    pub fn next_target(&self) -> Option<&str> {
        self.parameter(CommandKind::Next)
    }

    pub fn call_target(&self) -> Option<&str> {
        self.parameter(CommandKind::Call)
    }

    pub fn is_choice(&self) -> bool {
        self.has(CommandKind::Choice)
    }

    pub fn is_option(&self) -> bool {
        self.has(CommandKind::Option)
    }

    pub fn is_repeat(&self) -> bool {
        self.has(CommandKind::Repeat)
    }

    pub fn is_end(&self) -> bool {
        self.has(CommandKind::End)
    }

    pub fn is_else(&self) -> bool {
        self.has(CommandKind::Else)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.speaker {
            Some(speaker) => write!(f, "{}: {}", speaker, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Next {
    pub destination: LineId,
    pub conditions: Vec<Command>,
    pub effects: Vec<Command>,
}

impl Next {
    pub fn new(destination: LineId, line: &Line) -> Self {
        Self {
            destination,
            conditions: line.commands_of(CommandKind::If).cloned().collect(),
            effects: line.commands_of(CommandKind::Set).cloned().collect(),
        }
    }

    /// Continues this candidate through `line`, appending its own conditions
    /// and effects after the ones already gathered.
    pub fn extended(&self, destination: LineId, line: &Line) -> Self {
        let mut next = self.clone();
        next.destination = destination;
        next.conditions
            .extend(line.commands_of(CommandKind::If).cloned());
        next.effects.extend(line.commands_of(CommandKind::Set).cloned());
        next
    }

    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_with(commands: Vec<Command>) -> Line {
        Line::new(0, None, "Text", commands)
    }

    #[test]
    fn command_words_map_to_kinds() {
        for word in [
            "id", "next", "choice", "option", "repeat", "end", "call", "skip", "set", "if", "else",
        ] {
            let kind = CommandKind::from_word(word).expect("word should be known");
            assert_eq!(kind.as_word(), word);
        }
        assert_eq!(CommandKind::from_word("goto"), None);
        assert_eq!(CommandKind::from_word("ID"), None);
    }

    #[test]
    fn transparency_covers_empty_and_skip() {
        assert!(Line::new(0, None, "  ", vec![]).is_transparent());
        assert!(line_with(vec![Command::flag(CommandKind::Skip)]).is_transparent());
        assert!(!line_with(vec![]).is_transparent());
    }

    #[test]
    fn parameter_lookup_returns_first_match() {
        let line = line_with(vec![
            Command::with_parameter(CommandKind::Id, "a"),
            Command::with_parameter(CommandKind::Id, "b"),
        ]);
        assert_eq!(line.id(), Some("a"));
        assert_eq!(line.next_target(), None);
    }

    #[test]
    fn extending_a_next_keeps_earlier_entries_first() {
        let skip = Line::new(
            0,
            None,
            "",
            vec![
                Command::with_parameter(CommandKind::If, "a"),
                Command::with_parameter(CommandKind::Set, "x = 1"),
            ],
        );
        let content = line_with(vec![
            Command::with_parameter(CommandKind::Set, "y = 2"),
            Command::with_parameter(CommandKind::If, "b"),
        ]);

        let first = Next::new(LineId(0), &skip);
        let next = first.extended(LineId(1), &content);

        assert_eq!(next.destination, LineId(1));
        assert_eq!(
            next.conditions,
            vec![
                Command::with_parameter(CommandKind::If, "a"),
                Command::with_parameter(CommandKind::If, "b"),
            ]
        );
        assert_eq!(
            next.effects,
            vec![
                Command::with_parameter(CommandKind::Set, "x = 1"),
                Command::with_parameter(CommandKind::Set, "y = 2"),
            ]
        );
        assert!(!next.is_unconditional());
    }

    #[test]
    fn command_display_round_trips_source_syntax() {
        assert_eq!(Command::flag(CommandKind::Choice).to_string(), "choice");
        assert_eq!(
            Command::with_parameter(CommandKind::Call, "intro").to_string(),
            "call[[intro]]"
        );
        assert_eq!(
            Command::with_parameter(CommandKind::Set, "x = 1").to_string(),
            "set x = 1"
        );
    }
}
