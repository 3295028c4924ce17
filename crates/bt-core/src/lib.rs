pub mod diagnostic;
pub mod document;
pub mod error;
pub mod types;
pub mod value;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use document::CompiledDocument;
pub use error::BtError;
pub use types::*;
pub use value::*;
