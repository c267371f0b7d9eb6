//! Count-history extraction: event filtering, bin construction and
//! histogramming.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::{EventSource, MetaData};
use crate::history::CountHistory;
use crate::options::{ExtractionOptions, TimeAxis};

/// Upper bound (exclusive) on the number of time bins an extraction may
/// produce.
pub const MAX_TIME_BINS: f64 = 1e5;

/// Extract a count history from `events`, binned at `time_bin_sec`.
///
/// Events are filtered by `options.channel` and `options.energy_range_kev`
/// (half-open), and the surviving timestamps are counted into bins of
/// `time_bin_sec` seconds starting at
/// `time_origin - duration_before_origin_sec`. The call fails without
/// producing a partial history if the input or the options are invalid.
pub fn extract<S>(
    events: &S,
    time_bin_sec: f64,
    options: &ExtractionOptions,
) -> Result<CountHistory>
where
    S: EventSource + ?Sized,
{
    if events.is_empty() {
        return Err(Error::EmptyInput);
    }
    check_column_lengths(events)?;

    let duration_before_origin_sec = non_negative(
        "duration_before_origin_sec",
        options.duration_before_origin_sec,
    )?;
    let duration_after_origin_sec = non_negative(
        "duration_after_origin_sec",
        options.duration_after_origin_sec,
    )?;

    if let Some([start, stop]) = options.time_range {
        warn!(start, stop, "time_range option is accepted but not applied");
    }

    let selected = select_events(events, options);

    let time_origin = match options.time_origin {
        Some(origin) => origin,
        None => *selected.first().ok_or(Error::NoEventsSelected)?,
    };

    let range_start = time_origin - duration_before_origin_sec;
    let duration_sec = if duration_after_origin_sec == 0.0 {
        let last = *selected.last().ok_or(Error::NoEventsSelected)?;
        last - range_start
    } else {
        (time_origin + duration_after_origin_sec) - range_start
    };

    let nbins = duration_sec / time_bin_sec;
    if !(nbins > 0.0 && nbins < MAX_TIME_BINS) {
        return Err(Error::InvalidBinCount(nbins));
    }

    let mut edges = arange(range_start, time_origin + duration_sec, time_bin_sec);
    if edges.len() < 2 {
        return Err(Error::RangeShorterThanBin {
            duration_sec,
            time_bin_sec,
        });
    }
    let counts = histogram(&selected, &edges);

    let time_axis = options.time_axis.unwrap_or_default();
    if time_axis == TimeAxis::Relative {
        for edge in edges.iter_mut() {
            *edge -= time_origin;
        }
    }

    debug!(
        events = events.len(),
        selected = selected.len(),
        nbins = counts.len(),
        time_origin,
        %time_axis,
        "extracted count history"
    );

    let mut history = CountHistory::new(extraction_meta_data(events, options)?);
    history.time_origin = time_origin;
    history.time_axis = time_axis;
    history.time_bin_edge_list = edges;
    history.count_list = counts;
    Ok(history)
}

fn check_column_lengths<S: EventSource + ?Sized>(events: &S) -> Result<()> {
    let unix_time = events.unix_time().len();
    let energy = events.energy().len();
    let channel = events.channel().len();
    let trigger_count = events.trigger_count().len();
    if energy != unix_time || channel != unix_time || trigger_count != unix_time {
        return Err(Error::InconsistentInput {
            unix_time,
            energy,
            channel,
            trigger_count,
        });
    }
    Ok(())
}

fn non_negative(name: &'static str, value: Option<f64>) -> Result<f64> {
    let value = value.unwrap_or(0.0);
    if value < 0.0 {
        return Err(Error::InvalidDuration { name, value });
    }
    Ok(value)
}

/// Timestamps of the events that pass the channel and energy filters, in
/// source order.
fn select_events<S: EventSource + ?Sized>(events: &S, options: &ExtractionOptions) -> Vec<f64> {
    let mut mask = vec![true; events.len()];

    if let Some(channel) = options.channel {
        for (keep, &ch) in mask.iter_mut().zip(events.channel()) {
            *keep &= ch == channel;
        }
    }

    if let Some([lo, hi]) = options.energy_range_kev {
        for (keep, &e) in mask.iter_mut().zip(events.energy()) {
            *keep &= lo <= e && e < hi;
        }
    }

    events
        .unix_time()
        .iter()
        .zip(&mask)
        .filter_map(|(&t, &keep)| keep.then_some(t))
        .collect()
}

/// Evenly spaced values in `[start, stop)`, generated the way
/// `numpy.arange` does for floating-point arguments: the length is
/// `ceil((stop - start) / step)` and element `i` is `start + i * delta`
/// with `delta = (start + step) - start`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let len = ((stop - start) / step).ceil();
    if !(len > 0.0) {
        return Vec::new();
    }
    let len = len as usize;

    let mut values = Vec::with_capacity(len);
    values.push(start);
    if len > 1 {
        let next = start + step;
        let delta = next - start;
        values.push(next);
        for i in 2..len {
            values.push(start + i as f64 * delta);
        }
    }
    values
}

/// Count `samples` into the bins delimited by `edges`.
///
/// Bin `i` covers `[edges[i], edges[i + 1])`, except the last bin, which
/// also includes its upper edge. Samples outside `[edges[0], edges[M]]`
/// and NaNs are dropped. `edges` must be strictly increasing.
fn histogram(samples: &[f64], edges: &[f64]) -> Vec<u64> {
    let nbins = edges.len().saturating_sub(1);
    let mut counts = vec![0u64; nbins];
    if nbins == 0 {
        return counts;
    }

    let first = edges[0];
    let last = edges[nbins];
    for &t in samples {
        if !(t >= first && t <= last) {
            continue;
        }
        let bin = edges.partition_point(|&e| e <= t) - 1;
        counts[bin.min(nbins - 1)] += 1;
    }
    counts
}

fn extraction_meta_data<S: EventSource + ?Sized>(
    events: &S,
    options: &ExtractionOptions,
) -> Result<MetaData> {
    let extraction_option = serde_json::to_value(options).map_err(|e| Error::InvalidOption {
        key: "options".into(),
        reason: e.to_string(),
    })?;

    let mut meta_data = MetaData::new();
    meta_data.insert("extraction_option".into(), extraction_option);
    meta_data.insert(
        "eventfile_meta_data".into(),
        Value::Object(events.meta_data().clone()),
    );
    Ok(meta_data)
}
