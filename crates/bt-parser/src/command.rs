use bt_core::{Command, CommandKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommands {
    pub commands: Vec<Command>,
    pub unknown_words: Vec<String>,
}

/// Tokenizes the text between a pair of backticks.
///
/// `id` and `next` take the following word; `set` and `if` take every
/// remaining word, rejoined with single spaces. Unknown words are returned
/// separately and do not produce commands.
pub fn parse_command_body(body: &str) -> ParsedCommands {
    let words = body.split_whitespace().collect::<Vec<_>>();
    let mut parsed = ParsedCommands::default();
    let mut index = 0usize;

    while index < words.len() {
        let word = words[index];
        index += 1;

        let Some(kind) = CommandKind::from_word(word) else {
            parsed.unknown_words.push(word.to_string());
            continue;
        };

        let command = match kind {
            CommandKind::Id | CommandKind::Next => {
                let parameter = words.get(index).map(|word| (*word).to_string());
                if parameter.is_some() {
                    index += 1;
                }
                Command { kind, parameter }
            }
            CommandKind::Set | CommandKind::If => {
                let rest = words[index..].join(" ");
                index = words.len();
                Command {
                    kind,
                    parameter: (!rest.is_empty()).then_some(rest),
                }
            }
            _ => Command::flag(kind),
        };
        parsed.commands.push(command);
    }

    parsed
}
