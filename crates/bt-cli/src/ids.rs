use std::fs;
use std::io::{self, Write};

use bt_core::BtError;
use bt_parser::collect_id_list;

use crate::{output_failed, resolve_source_file, CliFailure, IdsArgs};

pub(crate) fn run_ids(args: IdsArgs) -> Result<i32, BtError> {
    let source = resolve_source_file(&args.file)?;
    let path = source.root_dir.join(&source.entry_file);
    let content = fs::read_to_string(&path).map_err(CliFailure::SourceRead.at(&path))?;
    let mut output = io::stdout();
    write_ids(&content, &mut output)?;
    Ok(0)
}

/// One `id<TAB>line` row per id.
pub(crate) fn write_ids(content: &str, output: &mut dyn Write) -> Result<(), BtError> {
    for (line, id) in collect_id_list(content) {
        writeln!(output, "{}\t{}", id, line.trim()).map_err(output_failed)?;
    }
    Ok(())
}
