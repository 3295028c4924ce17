mod choices;
pub mod expr;
mod session;
mod snapshot;
mod state;

pub use choices::{
    compute_choices, compute_choices_with_diagnostics, ChoiceResolution,
    DEFAULT_MAX_RESOLUTION_DEPTH,
};
pub use session::{
    Cursor, HistoryEntry, LoadTicket, Position, Session, SessionOptions, SourceReader,
};
pub use snapshot::{SessionSnapshot, SNAPSHOT_SCHEMA};
pub use state::StateStore;
