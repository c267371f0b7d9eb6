use std::path::Path;

use crate::ToolResult;

/// Summarize an event file.
pub fn run(file: &Path) -> ToolResult<String> {
    let eventfile = growth_eventfits::open(file)?;
    Ok(eventfile.to_string())
}
