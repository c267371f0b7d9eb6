use std::path::PathBuf;

/// All errors that can occur while opening or decoding an event file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file does not exist.
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    /// No reader exists for this kind of file.
    #[error("event file type of {} is not supported", .0.display())]
    UnsupportedFileType(PathBuf),
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A gzip stream could not be inflated.
    #[error("corrupt gzip stream")]
    Decompression,
    /// Premature end of data while reading.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Malformed FITS header.
    #[error("invalid FITS header: {0}")]
    InvalidHeader(&'static str),
    /// Malformed keyword name in a header card.
    #[error("invalid keyword name")]
    InvalidKeyword,
    /// A required keyword was not found in the header.
    #[error("missing required keyword: {0}")]
    MissingKeyword(String),
    /// No HDU carries the requested EXTNAME.
    #[error("no {0} extension in file")]
    MissingExtension(&'static str),
    /// The event table lacks a required column.
    #[error("missing column: {0}")]
    MissingColumn(String),
    /// A column has a TFORM that cannot be decoded into the requested type.
    #[error("column {name} has unsupported format {tform}")]
    UnsupportedColumn { name: String, tform: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
