mod command;
mod document;
mod ids;
mod line;

pub use command::{parse_command_body, ParsedCommands};
pub use document::{parse_document, ParsedDocument};
pub use ids::collect_id_list;
pub use line::parse_line;
