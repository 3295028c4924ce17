//! Pratt parser for conditions and effect statements.
//!
//! Precedence (low to high):
//!   `||` / `or`
//!   `&&` / `and`
//!   `==` / `!=`
//!   `<` / `<=` / `>` / `>=`
//!   `+` / `-`
//!   `*` / `/` / `%`
//!   `!` / `not` / unary `-`
//!   atoms

use bt_core::{BtError, BtValue};

use super::lexer::{parse_error, tokenize, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(BtValue),
    Key(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign {
        key: String,
        op: Option<BinaryOp>,
        value: Expr,
    },
    Step {
        key: String,
        delta: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Prec {
    None = 0,
    Or = 1,
    And = 2,
    Equality = 3,
    Compare = 4,
    Add = 5,
    Mul = 6,
}

pub fn parse_expression(source: &str) -> Result<Expr, BtError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression(Prec::None)?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        Token::Assign
        | Token::PlusAssign
        | Token::MinusAssign
        | Token::StarAssign
        | Token::SlashAssign
        | Token::Increment
        | Token::Decrement => Err(parse_error(
            source,
            "assignment is not allowed in a condition",
        )),
        other => Err(parse_error(source, format!("unexpected {:?}", other))),
    }
}

pub fn parse_statements(source: &str) -> Result<Vec<Statement>, BtError> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    loop {
        match parser.peek() {
            Token::Eof => break,
            Token::Semicolon => {
                parser.advance();
                continue;
            }
            _ => {}
        }
        statements.push(parser.statement()?);
        match parser.peek() {
            Token::Semicolon | Token::Eof => {}
            other => return Err(parse_error(source, format!("expected ';', got {:?}", other))),
        }
    }
    if statements.is_empty() {
        return Err(parse_error(source, "empty statement"));
    }
    Ok(statements)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, BtError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), BtError> {
        let token = self.advance();
        if token == expected {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, got {:?}", expected, token)))
        }
    }

    fn error(&self, detail: impl Into<String>) -> BtError {
        parse_error(self.source, detail)
    }

    fn statement(&mut self) -> Result<Statement, BtError> {
        if matches!(self.peek(), Token::Increment | Token::Decrement) {
            let delta = if self.advance() == Token::Increment { 1.0 } else { -1.0 };
            let key = self.key()?;
            return Ok(Statement::Step { key, delta });
        }

        let key = self.key()?;
        let op = match self.advance() {
            Token::Assign => None,
            Token::PlusAssign => Some(BinaryOp::Add),
            Token::MinusAssign => Some(BinaryOp::Sub),
            Token::StarAssign => Some(BinaryOp::Mul),
            Token::SlashAssign => Some(BinaryOp::Div),
            Token::Increment => return Ok(Statement::Step { key, delta: 1.0 }),
            Token::Decrement => return Ok(Statement::Step { key, delta: -1.0 }),
            other => {
                return Err(self.error(format!("expected assignment after key, got {:?}", other)))
            }
        };
        let value = self.expression(Prec::None)?;
        Ok(Statement::Assign { key, op, value })
    }

    fn key(&mut self) -> Result<String, BtError> {
        match self.advance() {
            Token::Ident(name) => self.finish_key(name),
            other => Err(self.error(format!("expected a key, got {:?}", other))),
        }
    }

    /// `state["k"]`, `state.k` and `k` all address the flat entry `k`.
    fn finish_key(&mut self, name: String) -> Result<String, BtError> {
        if name == "state" && *self.peek() == Token::LBracket {
            self.advance();
            let key = match self.advance() {
                Token::Str(key) => key,
                other => return Err(self.error(format!("expected string key, got {:?}", other))),
            };
            self.expect(Token::RBracket)?;
            return Ok(key);
        }
        match name.strip_prefix("state.") {
            Some(stripped) => Ok(stripped.to_string()),
            None => Ok(name),
        }
    }

    fn expression(&mut self, min_prec: Prec) -> Result<Expr, BtError> {
        let mut left = self.prefix()?;

        loop {
            let (op, prec) = match self.peek() {
                Token::Or => (BinaryOp::Or, Prec::Or),
                Token::And => (BinaryOp::And, Prec::And),
                Token::Eq => (BinaryOp::Eq, Prec::Equality),
                Token::Ne => (BinaryOp::Ne, Prec::Equality),
                Token::Lt => (BinaryOp::Lt, Prec::Compare),
                Token::Le => (BinaryOp::Le, Prec::Compare),
                Token::Gt => (BinaryOp::Gt, Prec::Compare),
                Token::Ge => (BinaryOp::Ge, Prec::Compare),
                Token::Plus => (BinaryOp::Add, Prec::Add),
                Token::Minus => (BinaryOp::Sub, Prec::Add),
                Token::Star => (BinaryOp::Mul, Prec::Mul),
                Token::Slash => (BinaryOp::Div, Prec::Mul),
                Token::Percent => (BinaryOp::Mod, Prec::Mul),
                _ => break,
            };
            if prec <= min_prec {
                break;
            }
            self.advance();
            // left-associative: the right side binds strictly tighter
            let right = self.expression(prec)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr, BtError> {
        match self.advance() {
            Token::Number(value) => Ok(Expr::Literal(BtValue::Number(value))),
            Token::Str(value) => Ok(Expr::Literal(BtValue::String(value))),
            Token::True => Ok(Expr::Literal(BtValue::Bool(true))),
            Token::False => Ok(Expr::Literal(BtValue::Bool(false))),
            Token::Null => Ok(Expr::Literal(BtValue::Null)),
            Token::Ident(name) => Ok(Expr::Key(self.finish_key(name)?)),
            Token::Not => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.unary_operand()?),
            }),
            Token::Minus => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.unary_operand()?),
            }),
            Token::LParen => {
                let inner = self.expression(Prec::None)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    fn unary_operand(&mut self) -> Result<Expr, BtError> {
        self.prefix()
    }
}
