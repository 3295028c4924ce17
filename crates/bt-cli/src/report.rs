use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

use bt_core::BtError;

/// Host-side failures layered on top of the library error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliFailure {
    Output,
    WorkingDir,
    SourceScan,
    SourceRead,
    StateWrite,
    StateRead,
    StateInvalid,
}

impl CliFailure {
    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::Output => "CLI_OUTPUT",
            Self::WorkingDir => "CLI_SOURCE_PATH",
            Self::SourceScan => "CLI_SOURCE_SCAN",
            Self::SourceRead => "CLI_SOURCE_READ",
            Self::StateWrite => "CLI_STATE_WRITE",
            Self::StateRead => "CLI_STATE_READ",
            Self::StateInvalid => "CLI_STATE_INVALID",
        }
    }

    pub(crate) fn wrap(self, error: impl Display) -> BtError {
        BtError::new(self.code(), error.to_string())
    }

    /// Error mapper that names the file involved.
    pub(crate) fn at<E: Display>(self, path: &Path) -> impl FnOnce(E) -> BtError + '_ {
        move |error| BtError::new(self.code(), format!("{}: {}", path.display(), error))
    }
}

pub(crate) fn output_failed(error: io::Error) -> BtError {
    CliFailure::Output.wrap(error)
}

/// Library codes (`DOCUMENT_*`, `EVAL_*`, `SESSION_*`...) are written as is.
pub(crate) fn write_error_report(output: &mut dyn Write, error: &BtError) -> io::Result<()> {
    writeln!(output, "RESULT:ERROR")?;
    writeln!(output, "ERROR_CODE:{}", error.code)?;
    let message = serde_json::to_string(&error.message).map_err(io::Error::from)?;
    writeln!(output, "ERROR_MSG_JSON:{}", message)?;
    if let Some(line_no) = error.line_no {
        writeln!(output, "ERROR_LINE:{}", line_no)?;
    }
    Ok(())
}

pub(crate) fn emit_error(error: BtError) -> i32 {
    tracing::debug!(code = %error.code, "command failed");
    if let Err(write_error) = write_error_report(&mut io::stdout().lock(), &error) {
        tracing::error!(%write_error, "could not write error report");
    }
    1
}
