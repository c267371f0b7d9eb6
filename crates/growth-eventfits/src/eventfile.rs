//! GROWTH event files: the `EVENTS` binary table of a FITS file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use growth_counthistory::{EventRecordSet, EventSource, MetaData};
use time::{format_description, OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::error::{Error, Result};
use crate::gzip;
use crate::hdu::{find_extension, parse_hdus, Hdu};
use crate::table::BinaryTable;

/// EXTNAME of the HDU holding the event list.
pub const EVENTS_EXTNAME: &str = "EVENTS";

pub const UNIX_TIME_COLUMN: &str = "unixTime";
pub const ENERGY_COLUMN: &str = "energy";
pub const CHANNEL_COLUMN: &str = "boardIndexAndChannel";
pub const TRIGGER_COUNT_COLUMN: &str = "triggerCount";

/// Header keywords shown in the file summary.
const SUMMARY_KEYWORDS: [(&str, &str); 4] = [
    ("OBS_SITE", "OBS_SITE"),
    ("DET_ID", "DET_ID  "),
    ("PL1_VER", "PL1_VER "),
    ("DET_CH0", "DET_CH0 "),
];

const JST_OFFSET_HOURS: i8 = 9;
const ISOT_FORMAT: &str = "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]";

/// An event FITS file decoded into memory.
#[derive(Debug, Clone)]
pub struct EventFitsFile {
    path: PathBuf,
    file_size: u64,
    events: EventRecordSet,
}

impl EventFitsFile {
    /// Read and decode the file at `path`. Gzip-compressed files are
    /// recognised by their magic bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(path, &bytes)
    }

    /// Decode an in-memory file image. `path` is only used for display.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        let path = path.into();
        let file_size = bytes.len() as u64;
        let events = if gzip::is_gzip(bytes) {
            let inflated = gzip::decompress(bytes)?;
            debug!(compressed = bytes.len(), inflated = inflated.len(), "inflated gzip event file");
            decode_events(&inflated)?
        } else {
            decode_events(bytes)?
        };
        debug!(path = %path.display(), nevents = events.len(), "loaded event file");
        Ok(EventFitsFile {
            path,
            file_size,
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file as stored, before any decompression.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn nevents(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &EventRecordSet {
        &self.events
    }

    pub fn into_events(self) -> EventRecordSet {
        self.events
    }

    /// A header keyword of the EVENTS HDU rendered as text.
    pub fn header_text(&self, keyword: &str) -> Option<String> {
        self.events.meta_data.get(keyword).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl EventSource for EventFitsFile {
    fn unix_time(&self) -> &[f64] {
        &self.events.unix_time
    }

    fn energy(&self) -> &[f64] {
        &self.events.energy
    }

    fn channel(&self) -> &[i64] {
        &self.events.channel
    }

    fn trigger_count(&self) -> &[i64] {
        &self.events.trigger_count
    }

    fn meta_data(&self) -> &MetaData {
        &self.events.meta_data
    }
}

/// Decode the EVENTS table of an uncompressed FITS image.
pub fn decode_events(data: &[u8]) -> Result<EventRecordSet> {
    let hdus = parse_hdus(data)?;
    let hdu = find_extension(&hdus, EVENTS_EXTNAME).ok_or(Error::MissingExtension(EVENTS_EXTNAME))?;
    let table = BinaryTable::new(hdu, data)?;
    debug!(hdu = hdu.index, rows = table.nrows(), columns = table.columns().len(), "decoding events");

    let events = EventRecordSet::new(
        table.read_f64(UNIX_TIME_COLUMN)?,
        table.read_f64(ENERGY_COLUMN)?,
        table.read_i64(CHANNEL_COLUMN)?,
        table.read_i64(TRIGGER_COUNT_COLUMN)?,
    );
    Ok(events.with_meta_data(header_meta_data(hdu)))
}

/// Every valued, non-commentary card of `hdu` as a metadata entry. A
/// repeated keyword keeps its last value.
pub fn header_meta_data(hdu: &Hdu) -> MetaData {
    hdu.cards
        .iter()
        .filter(|card| !card.is_commentary())
        .filter_map(|card| Some((card.keyword.clone(), card.value.as_ref()?.to_json())))
        .collect()
}

/// ISO-8601 timestamp with millisecond precision in the given offset.
fn isot(unix_time: f64, offset: UtcOffset) -> Option<String> {
    let millis = (unix_time * 1e3).round() as i128;
    let at = OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000).ok()?;
    let format = format_description::parse(ISOT_FORMAT).ok()?;
    at.to_offset(offset).format(&format).ok()
}

impl fmt::Display for EventFitsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy());
        writeln!(f, "{} ({:.2} MB)", name, (self.file_size >> 20) as f64)?;
        for (keyword, label) in SUMMARY_KEYWORDS {
            let text = self.header_text(keyword).unwrap_or_else(|| "-".to_string());
            writeln!(f, "{label}: {text}")?;
        }
        writeln!(f, "Number of Events: {}", self.nevents())?;

        let times = &self.events.unix_time;
        let (Some(&start), Some(&stop)) = (times.first(), times.last()) else {
            return Ok(());
        };
        let jst = UtcOffset::from_hms(JST_OFFSET_HOURS, 0, 0).map_err(|_| fmt::Error)?;
        let stamp = |t: f64, offset: UtcOffset| isot(t, offset).unwrap_or_else(|| "-".to_string());
        writeln!(f, "Start (UTC): {}", stamp(start, UtcOffset::UTC))?;
        writeln!(f, "Stop  (UTC): {}", stamp(stop, UtcOffset::UTC))?;
        writeln!(f, "Start (JST): {}", stamp(start, jst))?;
        writeln!(f, "Stop  (JST): {}", stamp(stop, jst))?;

        let duration = stop - start;
        writeln!(f, "Duration (min): {:.3}", duration / 60.0)?;
        writeln!(f, "All event rate (cps): {:.3}", self.nevents() as f64 / duration)
    }
}
