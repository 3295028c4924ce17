use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct BtError {
    pub code: String,
    pub message: String,
    pub line_no: Option<usize>,
}

impl BtError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line_no: None,
        }
    }

    pub fn at_line(code: impl Into<String>, message: impl Into<String>, line_no: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line_no: Some(line_no),
        }
    }
}
