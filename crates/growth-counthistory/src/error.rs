/// All errors that can occur while extracting, inspecting or persisting a
/// count history.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The options contain a key the extractor does not accept.
    #[error("option `{0}` is not accepted by the count-history extractor")]
    UnrecognizedOption(String),
    /// A recognised option carries a value of the wrong type.
    #[error("invalid value for option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
    /// The event source has no rows.
    #[error("cannot extract a count history from a blank event source")]
    EmptyInput,
    /// The event columns do not all have the same number of rows.
    #[error(
        "event columns differ in length (unix_time={unix_time}, energy={energy}, \
         channel={channel}, trigger_count={trigger_count})"
    )]
    InconsistentInput {
        unix_time: usize,
        energy: usize,
        channel: usize,
        trigger_count: usize,
    },
    /// No event survived the channel/energy filters, so the time range
    /// cannot be anchored.
    #[error("no events left after applying the channel/energy filters")]
    NoEventsSelected,
    /// `energy_range_kev` is not a pair of numbers.
    #[error("energy_range_kev must be a list of 2 energy values in keV")]
    InvalidEnergyRange,
    /// A duration option is negative.
    #[error("{name} must not be negative (got {value})")]
    InvalidDuration { name: &'static str, value: f64 },
    /// The requested binning yields no bins or too many bins.
    #[error("cannot create {0} time bins")]
    InvalidBinCount(f64),
    /// The resolved time range does not span a single whole bin.
    #[error("time range of {duration_sec} s is shorter than one {time_bin_sec} s bin")]
    RangeShorterThanBin { duration_sec: f64, time_bin_sec: f64 },
    /// `time_axis` is neither `absolute` nor `relative`.
    #[error("time_axis must be either \"absolute\" or \"relative\" (got {0:?})")]
    InvalidAxisMode(String),
    /// Edge and count lists of a count history are out of step.
    #[error("lengths of time bin list ({bins}) and count list ({counts}) differ")]
    MismatchedLength { bins: usize, counts: usize },
    /// The document is not tagged `"type": "counthistory"`.
    #[error("not a count-history document")]
    NotACountHistory,
    /// The document is tagged correctly but its content is malformed.
    #[error("invalid count-history document: {0}")]
    InvalidDocument(String),
    /// An I/O error at the codec boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unrecognized_option() {
        let e = Error::UnrecognizedOption("abc".into());
        assert_eq!(
            e.to_string(),
            "option `abc` is not accepted by the count-history extractor"
        );
    }

    #[test]
    fn display_invalid_duration() {
        let e = Error::InvalidDuration {
            name: "duration_before_origin_sec",
            value: -1.0,
        };
        assert_eq!(
            e.to_string(),
            "duration_before_origin_sec must not be negative (got -1)"
        );
    }

    #[test]
    fn display_invalid_bin_count() {
        let e = Error::InvalidBinCount(-15.5);
        assert_eq!(e.to_string(), "cannot create -15.5 time bins");
    }

    #[test]
    fn display_range_shorter_than_bin() {
        let e = Error::RangeShorterThanBin {
            duration_sec: 0.5,
            time_bin_sec: 1.0,
        };
        assert_eq!(e.to_string(), "time range of 0.5 s is shorter than one 1 s bin");
    }

    #[test]
    fn display_mismatched_length() {
        let e = Error::MismatchedLength { bins: 1, counts: 2 };
        assert_eq!(
            e.to_string(),
            "lengths of time bin list (1) and count list (2) differ"
        );
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::other("oops");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn std_error_source() {
        use std::error::Error as StdError;

        assert!(Error::EmptyInput.source().is_none());
        let e = Error::Io(std::io::Error::other("inner"));
        assert!(e.source().is_some());
    }
}
