use std::path::Path;

use growth_counthistory::read_json_file;

use crate::ToolResult;

/// Reload a count history and describe it.
pub fn run(file: &Path) -> ToolResult<String> {
    let history = read_json_file(file)?;
    Ok(format!("{history}\n"))
}
