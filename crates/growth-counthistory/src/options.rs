//! Extraction options and the time-axis mode.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::MetaData;

/// Option keys understood by [`crate::extract`].
pub const ACCEPTED_OPTION_KEYS: [&str; 7] = [
    "time_axis",
    "time_origin",
    "energy_range_kev",
    "time_range",
    "channel",
    "duration_before_origin_sec",
    "duration_after_origin_sec",
];

/// How bin edges of a count history are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeAxis {
    /// Edges are Unix timestamps.
    #[default]
    Absolute,
    /// Edges are offsets in seconds from the time origin.
    Relative,
}

impl TimeAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeAxis::Absolute => "absolute",
            TimeAxis::Relative => "relative",
        }
    }
}

impl fmt::Display for TimeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(TimeAxis::Absolute),
            "relative" => Ok(TimeAxis::Relative),
            other => Err(Error::InvalidAxisMode(other.to_string())),
        }
    }
}

/// Filters and binning controls for a single extraction.
///
/// Every field is optional; unset fields fall back to the defaults described
/// on each field. Serializing skips unset fields, so the snapshot stored in a
/// count history's metadata contains exactly what the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MetaData")]
pub struct ExtractionOptions {
    /// Axis of the output edges. Defaults to [`TimeAxis::Absolute`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_axis: Option<TimeAxis>,
    /// Reference instant. Defaults to the first event left after filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_origin: Option<f64>,
    /// Half-open energy window `[lo, hi)` in keV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_range_kev: Option<[f64; 2]>,
    /// Accepted for compatibility with existing option files; not applied
    /// as a filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<[f64; 2]>,
    /// Keep only events from this channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<i64>,
    /// Seconds to include before the origin. Defaults to 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_before_origin_sec: Option<f64>,
    /// Seconds to include after the origin. 0 (the default) extends the
    /// range to the last filtered event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_after_origin_sec: Option<f64>,
}

impl ExtractionOptions {
    pub fn with_time_axis(mut self, time_axis: TimeAxis) -> Self {
        self.time_axis = Some(time_axis);
        self
    }

    pub fn with_time_origin(mut self, time_origin: f64) -> Self {
        self.time_origin = Some(time_origin);
        self
    }

    pub fn with_energy_range_kev(mut self, lo: f64, hi: f64) -> Self {
        self.energy_range_kev = Some([lo, hi]);
        self
    }

    pub fn with_time_range(mut self, start: f64, stop: f64) -> Self {
        self.time_range = Some([start, stop]);
        self
    }

    pub fn with_channel(mut self, channel: i64) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_duration_before_origin_sec(mut self, sec: f64) -> Self {
        self.duration_before_origin_sec = Some(sec);
        self
    }

    pub fn with_duration_after_origin_sec(mut self, sec: f64) -> Self {
        self.duration_after_origin_sec = Some(sec);
        self
    }

    /// Build options from a JSON value, which must be an object.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_json_map(map),
            other => Err(Error::InvalidOption {
                key: "options".into(),
                reason: format!("expected a JSON object, got {other}"),
            }),
        }
    }

    /// Build options from a JSON object.
    ///
    /// Unknown keys are rejected before any value is inspected.
    pub fn from_json_map(map: &MetaData) -> Result<Self> {
        if let Some(key) = map
            .keys()
            .find(|k| !ACCEPTED_OPTION_KEYS.contains(&k.as_str()))
        {
            return Err(Error::UnrecognizedOption(key.clone()));
        }

        let mut options = ExtractionOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "time_axis" => {
                    let axis = match value {
                        Value::String(s) => s.parse()?,
                        other => return Err(Error::InvalidAxisMode(other.to_string())),
                    };
                    options.time_axis = Some(axis);
                }
                "time_origin" => options.time_origin = Some(number(key, value)?),
                "energy_range_kev" => {
                    options.energy_range_kev =
                        Some(pair(value).ok_or(Error::InvalidEnergyRange)?);
                }
                "time_range" => {
                    options.time_range = Some(pair(value).ok_or_else(|| Error::InvalidOption {
                        key: key.clone(),
                        reason: "expected a list of 2 numbers".into(),
                    })?);
                }
                "channel" => {
                    options.channel = Some(value.as_i64().ok_or_else(|| Error::InvalidOption {
                        key: key.clone(),
                        reason: format!("expected an integer, got {value}"),
                    })?);
                }
                "duration_before_origin_sec" => {
                    options.duration_before_origin_sec = Some(number(key, value)?);
                }
                "duration_after_origin_sec" => {
                    options.duration_after_origin_sec = Some(number(key, value)?);
                }
                other => return Err(Error::UnrecognizedOption(other.to_string())),
            }
        }
        Ok(options)
    }
}

impl TryFrom<MetaData> for ExtractionOptions {
    type Error = Error;

    fn try_from(map: MetaData) -> Result<Self> {
        Self::from_json_map(&map)
    }
}

fn number(key: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::InvalidOption {
        key: key.to_string(),
        reason: format!("expected a number, got {value}"),
    })
}

fn pair(value: &Value) -> Option<[f64; 2]> {
    match value.as_array()?.as_slice() {
        [lo, hi] => Some([lo.as_f64()?, hi.as_f64()?]),
        _ => None,
    }
}
