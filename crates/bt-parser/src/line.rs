use bt_core::{Command, CommandKind, Line};

use crate::command::parse_command_body;

#[derive(Debug, Clone)]
pub(crate) struct ScannedLine {
    pub(crate) line: Line,
    pub(crate) unknown_words: Vec<String>,
}

/// Parses one bullet line, or returns `None` when the text is not a
/// dialogue line (blank lines, prose, headings).
///
/// Expected shape: `<indent><* or -><space>[Speaker:]Text with `commands``.
pub fn parse_line(raw: &str) -> Option<Line> {
    scan_line(raw).map(|scanned| scanned.line)
}

pub(crate) fn scan_line(raw: &str) -> Option<ScannedLine> {
    let (indent, body) = split_bullet(raw)?;
    let chars = body.chars().collect::<Vec<_>>();

    let mut text = String::new();
    let mut speaker: Option<String> = None;
    let mut commands: Vec<Command> = Vec::new();
    let mut unknown_words = Vec::new();
    let mut bracket_depth = 0usize;
    let mut index = 0usize;

    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '`' => {
                let start = index + 1;
                let Some(close) = chars[start..].iter().position(|c| *c == '`') else {
                    // unterminated command, dropped
                    break;
                };
                let close = start + close;
                let body = chars[start..close].iter().collect::<String>();
                let mut parsed = parse_command_body(&body);
                index = close + 1;

                if parsed
                    .commands
                    .iter()
                    .any(|command| command.kind == CommandKind::Call)
                {
                    if let Some((target, consumed)) = bracket_target(&chars[index..]) {
                        for command in parsed.commands.iter_mut() {
                            if command.kind == CommandKind::Call && command.parameter.is_none() {
                                command.parameter = Some(target.clone());
                            }
                        }
                        index += consumed;
                    }
                }

                commands.append(&mut parsed.commands);
                unknown_words.append(&mut parsed.unknown_words);
            }
            '\\' if chars.get(index + 1) == Some(&':') => {
                text.push(':');
                index += 2;
            }
            ':' if speaker.is_none() && bracket_depth == 0 => {
                speaker = Some(unwrap_speaker(text.trim()));
                text.clear();
                index += 1;
            }
            '[' => {
                bracket_depth += 1;
                text.push(ch);
                index += 1;
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                text.push(ch);
                index += 1;
            }
            _ => {
                text.push(ch);
                index += 1;
            }
        }
    }

    Some(ScannedLine {
        line: Line::new(indent, speaker, text.trim(), commands),
        unknown_words,
    })
}

/// Counts the indentation (space = 1, tab = 4) and strips the bullet marker.
fn split_bullet(raw: &str) -> Option<(usize, &str)> {
    let mut indent = 0usize;
    for (offset, ch) in raw.char_indices() {
        match ch {
            ' ' => indent += 1,
            '\t' => indent += 4,
            '*' | '-' => {
                let body = raw[offset + ch.len_utf8()..].strip_prefix(' ')?;
                return Some((indent, body));
            }
            _ => return None,
        }
    }
    None
}

/// Reads a `[[target]]` link directly after a `call` command.
fn bracket_target(chars: &[char]) -> Option<(String, usize)> {
    if chars.len() < 2 || chars[0] != '[' || chars[1] != '[' {
        return None;
    }
    let inner = &chars[2..];
    let close = inner
        .windows(2)
        .position(|pair| pair[0] == ']' && pair[1] == ']');
    match close {
        Some(close) => Some((inner[..close].iter().collect(), close + 4)),
        None => Some((inner.iter().collect(), chars.len())),
    }
}

fn unwrap_speaker(raw: &str) -> String {
    raw.strip_prefix("[[")
        .and_then(|inner| inner.strip_suffix("]]"))
        .unwrap_or(raw)
        .to_string()
}
