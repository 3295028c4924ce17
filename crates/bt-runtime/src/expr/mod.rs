//! Restricted statement and condition language evaluated against the flat
//! session state.

mod eval;
mod lexer;
mod parser;

pub use eval::{evaluate, execute};
pub use parser::{parse_expression, parse_statements, BinaryOp, Expr, Statement, UnaryOp};
