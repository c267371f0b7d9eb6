//! Persistence of count histories as tagged JSON documents.
//!
//! ```json
//! { "type": "counthistory",
//!   "content": {
//!     "time_origin": 1514734663.0,
//!     "time_bin_edge_list": [-30.0, -20.0, ...],
//!     "count_list": [1441, 1363, ...],
//!     "effective_time_list": [],
//!     "gti_list": [],
//!     "meta_data": { "extraction_option": {...}, "eventfile_meta_data": {...} },
//!     "time_axis": "relative" } }
//! ```
//!
//! Counts are written as JSON integers and edges as JSON floats. Unknown
//! content keys are ignored on read so that later writers may add fields.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::MetaData;
use crate::history::CountHistory;
use crate::options::TimeAxis;

/// Value of the top-level `type` tag.
pub const DOCUMENT_TYPE: &str = "counthistory";

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: ContentRef<'a>,
}

#[derive(Serialize)]
struct ContentRef<'a> {
    time_origin: f64,
    time_bin_edge_list: &'a [f64],
    count_list: &'a [u64],
    effective_time_list: &'a [f64],
    gti_list: &'a [f64],
    meta_data: &'a MetaData,
    time_axis: TimeAxis,
}

#[derive(Deserialize)]
struct Content {
    time_origin: f64,
    time_bin_edge_list: Vec<f64>,
    count_list: Vec<u64>,
    #[serde(default)]
    effective_time_list: Vec<f64>,
    #[serde(default)]
    gti_list: Vec<f64>,
    meta_data: MetaData,
    time_axis: TimeAxis,
}

impl<'a> From<&'a CountHistory> for DocumentRef<'a> {
    fn from(history: &'a CountHistory) -> Self {
        DocumentRef {
            kind: DOCUMENT_TYPE,
            content: ContentRef {
                time_origin: history.time_origin,
                time_bin_edge_list: &history.time_bin_edge_list,
                count_list: &history.count_list,
                effective_time_list: &history.effective_time_list,
                gti_list: &history.gti_list,
                meta_data: &history.meta_data,
                time_axis: history.time_axis,
            },
        }
    }
}

impl From<Content> for CountHistory {
    fn from(content: Content) -> Self {
        CountHistory {
            time_origin: content.time_origin,
            time_axis: content.time_axis,
            time_bin_edge_list: content.time_bin_edge_list,
            count_list: content.count_list,
            effective_time_list: content.effective_time_list,
            gti_list: content.gti_list,
            meta_data: content.meta_data,
        }
    }
}

fn json_error(e: serde_json::Error) -> Error {
    if e.is_io() {
        Error::Io(e.into())
    } else {
        Error::InvalidDocument(e.to_string())
    }
}

/// Write `history` as an indented JSON document.
pub fn write_json<W: Write>(mut writer: W, history: &CountHistory) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &DocumentRef::from(history)).map_err(json_error)?;
    writer.flush()?;
    Ok(())
}

/// Decode a count history from a JSON value.
pub fn from_json_value(value: &Value) -> Result<CountHistory> {
    if value.get("type").and_then(Value::as_str) != Some(DOCUMENT_TYPE) {
        return Err(Error::NotACountHistory);
    }
    let content = value
        .get("content")
        .ok_or_else(|| Error::InvalidDocument("missing field `content`".into()))?;
    let content = Content::deserialize(content).map_err(json_error)?;
    Ok(content.into())
}

/// Read a count history from a JSON document.
pub fn read_json<R: Read>(reader: R) -> Result<CountHistory> {
    let value: Value = serde_json::from_reader(reader).map_err(json_error)?;
    from_json_value(&value)
}

/// Write `history` to the file at `path`, replacing any existing file.
pub fn write_json_file<P: AsRef<Path>>(path: P, history: &CountHistory) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_json(BufWriter::new(file), history)?;
    debug!(path = %path.display(), nbins = history.nbins(), "wrote count history");
    Ok(())
}

/// Read a count history from the file at `path`.
pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<CountHistory> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let history = read_json(BufReader::new(file))?;
    debug!(path = %path.display(), nbins = history.nbins(), "read count history");
    Ok(history)
}
