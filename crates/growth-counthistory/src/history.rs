//! The count-history record and its derived numeric views.

use core::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::events::MetaData;
use crate::options::TimeAxis;

/// A binned event-count history (light curve).
///
/// `time_bin_edge_list` holds `M + 1` strictly increasing edges defining
/// `M` half-open bins, and `count_list` holds one count per bin. The fields
/// are public so that histories can be assembled or adjusted by hand; the
/// derived views check the edge/count invariant and fail with
/// [`Error::MismatchedLength`] when it does not hold.
#[derive(Debug, Clone, PartialEq)]
pub struct CountHistory {
    /// Reference instant (Unix time).
    pub time_origin: f64,
    /// Whether edges are absolute timestamps or offsets from `time_origin`.
    pub time_axis: TimeAxis,
    pub time_bin_edge_list: Vec<f64>,
    pub count_list: Vec<u64>,
    /// Good-time bookkeeping; carried through persistence, not computed.
    pub effective_time_list: Vec<f64>,
    pub gti_list: Vec<f64>,
    /// `extraction_option` and `eventfile_meta_data` for extracted histories.
    pub meta_data: MetaData,
}

/// Snapshot of a count history for logging and display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub time_origin: f64,
    pub time_axis: TimeAxis,
    pub nbins: usize,
    pub max_count: Option<u64>,
    pub mean_count: Option<f64>,
    pub min_count: Option<u64>,
    /// Population standard deviation.
    pub stddev_count: Option<f64>,
}

impl Default for CountHistory {
    fn default() -> Self {
        CountHistory::new(MetaData::new())
    }
}

impl CountHistory {
    /// Create an empty history on the absolute axis.
    pub fn new(meta_data: MetaData) -> Self {
        CountHistory {
            time_origin: 0.0,
            time_axis: TimeAxis::Absolute,
            time_bin_edge_list: Vec::new(),
            count_list: Vec::new(),
            effective_time_list: Vec::new(),
            gti_list: Vec::new(),
            meta_data,
        }
    }

    /// Number of bins, taken from the count list.
    pub fn nbins(&self) -> usize {
        self.count_list.len()
    }

    /// Width of each bin in seconds.
    pub fn time_bin_width(&self) -> Vec<f64> {
        self.time_bin_edge_list
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect()
    }

    /// Midpoint of each bin, on the history's time axis.
    pub fn time_bin_center(&self) -> Vec<f64> {
        self.time_bin_edge_list
            .windows(2)
            .map(|w| (w[1] + w[0]) / 2.0)
            .collect()
    }

    /// Counts divided by bin width, in counts per second.
    pub fn count_rate(&self) -> Result<Vec<f64>> {
        let widths = self.checked_widths()?;
        Ok(self
            .count_list
            .iter()
            .zip(&widths)
            .map(|(&c, &w)| c as f64 / w)
            .collect())
    }

    /// Poisson error on the count rate: `sqrt(count) / width`.
    pub fn count_rate_error(&self) -> Result<Vec<f64>> {
        self.count_rate_error_with(f64::sqrt)
    }

    /// Count-rate error using a custom per-bin error function applied to
    /// the raw count before dividing by the bin width.
    pub fn count_rate_error_with<F>(&self, error_function: F) -> Result<Vec<f64>>
    where
        F: Fn(f64) -> f64,
    {
        let widths = self.checked_widths()?;
        Ok(self
            .count_list
            .iter()
            .zip(&widths)
            .map(|(&c, &w)| error_function(c as f64) / w)
            .collect())
    }

    fn checked_widths(&self) -> Result<Vec<f64>> {
        let widths = self.time_bin_width();
        if widths.len() != self.count_list.len() {
            return Err(Error::MismatchedLength {
                bins: widths.len(),
                counts: self.count_list.len(),
            });
        }
        Ok(widths)
    }

    /// Summary statistics of the count list. Statistics are `None` when the
    /// history has no bins.
    pub fn summary(&self) -> Summary {
        let counts = &self.count_list;
        let (mean, stddev) = if counts.is_empty() {
            (None, None)
        } else {
            let n = counts.len() as f64;
            let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
            let var = counts
                .iter()
                .map(|&c| {
                    let d = c as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            (Some(mean), Some(var.sqrt()))
        };

        Summary {
            time_origin: self.time_origin,
            time_axis: self.time_axis,
            nbins: counts.len(),
            max_count: counts.iter().copied().max(),
            mean_count: mean,
            min_count: counts.iter().copied().min(),
            stddev_count: stddev,
        }
    }

    /// Energy window recorded in `meta_data.extraction_option`, if any.
    pub fn energy_range_kev(&self) -> Option<[f64; 2]> {
        let range = self
            .meta_data
            .get("extraction_option")?
            .get("energy_range_kev")?
            .as_array()?;
        match range.as_slice() {
            [lo, hi] => Some([lo.as_f64()?, hi.as_f64()?]),
            _ => None,
        }
    }
}

impl fmt::Display for CountHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = serde_json::to_string(&self.summary()).map_err(|_| fmt::Error)?;
        f.write_str(&summary)
    }
}
