//! Count-history extraction for GROWTH gamma-ray detector event lists.
//!
//! An [`EventSource`] supplies decoded event columns; [`extract`] filters
//! them, bins the surviving timestamps and returns a [`CountHistory`], which
//! the [`codec`] module persists as a tagged JSON document.

pub mod codec;
pub mod error;
pub mod events;
pub mod extract;
pub mod history;
pub mod options;

#[cfg(feature = "array")]
pub mod array;

pub use codec::{read_json, read_json_file, write_json, write_json_file};
pub use error::{Error, Result};
pub use events::{EventRecordSet, EventSource, MetaData};
pub use extract::{extract, MAX_TIME_BINS};
pub use history::{CountHistory, Summary};
pub use options::{ExtractionOptions, TimeAxis};
