//! Command implementations behind the `growth` binary.
//!
//! Each `*_cmd` module exposes a `run` function that performs one
//! subcommand and returns the text to print, so the commands can be driven
//! from tests without spawning a process.

pub mod cli;
pub mod extract_cmd;
pub mod show_cmd;
pub mod summary_cmd;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    EventFile(#[from] growth_eventfits::Error),
    #[error(transparent)]
    CountHistory(#[from] growth_counthistory::Error),
    #[error("cannot read options file {}: {source}", .path.display())]
    OptionsFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("options file {} is not valid JSON: {source}", .path.display())]
    OptionsJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type ToolResult<T> = Result<T, ToolError>;
