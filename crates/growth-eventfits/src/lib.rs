//! Reader for GROWTH detector event files.
//!
//! Event files are FITS files (optionally gzip-compressed) whose `EVENTS`
//! binary table carries one row per detected event. [`open`] decodes such a
//! file into an [`EventFitsFile`], which implements
//! [`growth_counthistory::EventSource`] and can be handed straight to
//! [`growth_counthistory::extract`].

pub mod card;
pub mod error;
pub mod eventfile;
pub mod gzip;
pub mod hdu;
pub mod table;

use std::path::Path;

pub use error::{Error, Result};
pub use eventfile::{decode_events, EventFitsFile, EVENTS_EXTNAME};

/// Open an event file, choosing the reader from the file name.
///
/// Only FITS files are supported: any name containing `.fits`
/// (`.fits`, `.fits.gz`, ...) is accepted.
pub fn open(path: impl AsRef<Path>) -> Result<EventFitsFile> {
    let path = path.as_ref();
    if !path.to_string_lossy().contains(".fits") {
        return Err(Error::UnsupportedFileType(path.to_path_buf()));
    }
    EventFitsFile::open(path)
}
