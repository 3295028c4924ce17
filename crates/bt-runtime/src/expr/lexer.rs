//! Tokenizer for `set` statements and `if` conditions.
//!
//! Keys are read as one token including inner dots, so `line.b2.visits`
//! names a single flat state entry.

use bt_core::BtError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Increment,
    Decrement,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Eof,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, BtError> {
    let chars = source.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && peek_is_digit(&chars, pos + 1)) {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let raw = chars[start..pos].iter().collect::<String>();
            let value = raw
                .parse::<f64>()
                .map_err(|_| parse_error(source, format!("invalid number \"{}\"", raw)))?;
            tokens.push(Token::Number(value));
            continue;
        }

        if is_ident_start(ch) {
            let start = pos;
            pos += 1;
            loop {
                while pos < chars.len() && is_ident_char(chars[pos]) {
                    pos += 1;
                }
                if pos + 1 < chars.len() && chars[pos] == '.' && is_ident_char(chars[pos + 1]) {
                    pos += 1;
                    continue;
                }
                break;
            }
            let word = chars[start..pos].iter().collect::<String>();
            tokens.push(keyword(&word).unwrap_or(Token::Ident(word)));
            continue;
        }

        if ch == '"' || ch == '\'' {
            let (value, next) = read_string(&chars, pos, source)?;
            tokens.push(Token::Str(value));
            pos = next;
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let third = chars.get(pos + 2).copied();
        let (token, width) = match (ch, next, third) {
            ('=', Some('='), Some('=')) => (Token::Eq, 3),
            ('!', Some('='), Some('=')) => (Token::Ne, 3),
            ('=', Some('='), _) => (Token::Eq, 2),
            ('!', Some('='), _) => (Token::Ne, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('+', Some('+'), _) => (Token::Increment, 2),
            ('-', Some('-'), _) => (Token::Decrement, 2),
            ('+', Some('='), _) => (Token::PlusAssign, 2),
            ('-', Some('='), _) => (Token::MinusAssign, 2),
            ('*', Some('='), _) => (Token::StarAssign, 2),
            ('/', Some('='), _) => (Token::SlashAssign, 2),
            ('=', _, _) => (Token::Assign, 1),
            ('!', _, _) => (Token::Not, 1),
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            (';', _, _) => (Token::Semicolon, 1),
            _ => {
                return Err(parse_error(
                    source,
                    format!("unexpected character '{}'", ch),
                ))
            }
        };
        tokens.push(token);
        pos += width;
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

pub(crate) fn parse_error(source: &str, detail: impl Into<String>) -> BtError {
    BtError::new(
        "EVAL_PARSE",
        format!("{} in \"{}\"", detail.into(), source),
    )
}

fn keyword(word: &str) -> Option<Token> {
    let token = match word {
        "true" => Token::True,
        "false" => Token::False,
        "null" | "undefined" => Token::Null,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => return None,
    };
    Some(token)
}

fn read_string(chars: &[char], start: usize, source: &str) -> Result<(String, usize), BtError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() => {
                let escaped = chars[pos + 1];
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                pos += 2;
            }
            ch if ch == quote => return Ok((value, pos + 1)),
            ch => {
                value.push(ch);
                pos += 1;
            }
        }
    }
    Err(parse_error(source, "unterminated string literal"))
}

fn peek_is_digit(chars: &[char], pos: usize) -> bool {
    chars.get(pos).is_some_and(|ch| ch.is_ascii_digit())
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod lexer_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dotted_keys_are_single_tokens() {
        let tokens = tokenize("line.b2.visits >= 2").expect("lex should pass");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("line.b2.visits".to_string()),
                Token::Ge,
                Token::Number(2.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn operators_and_keywords() {
        let tokens = tokenize("!a && b || not c and d or e === f !== g").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Not,
                Token::Ident("a".to_string()),
                Token::And,
                Token::Ident("b".to_string()),
                Token::Or,
                Token::Not,
                Token::Ident("c".to_string()),
                Token::And,
                Token::Ident("d".to_string()),
                Token::Or,
                Token::Ident("e".to_string()),
                Token::Eq,
                Token::Ident("f".to_string()),
                Token::Ne,
                Token::Ident("g".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn assignments_and_increments() {
        let tokens = tokenize("x += 1; y++; z = 'a b'").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("x".to_string()),
                Token::PlusAssign,
                Token::Number(1.0),
                Token::Semicolon,
                Token::Ident("y".to_string()),
                Token::Increment,
                Token::Semicolon,
                Token::Ident("z".to_string()),
                Token::Assign,
                Token::Str("a b".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn bracket_keys() {
        let tokens = tokenize("state[\"line.intro\"]").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("state".to_string()),
                Token::LBracket,
                Token::Str("line.intro".to_string()),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unknown_characters_and_open_strings() {
        assert_eq!(tokenize("a # b").expect_err("lex should fail").code, "EVAL_PARSE");
        assert_eq!(tokenize("'open").expect_err("lex should fail").code, "EVAL_PARSE");
        assert_eq!(tokenize("1.2.3").expect_err("lex should fail").code, "EVAL_PARSE");
    }
}
