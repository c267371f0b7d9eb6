//! The column-oriented event interface consumed by the extractor.

use serde_json::{Map, Value};

/// Free-form metadata attached to an event source or a count history.
pub type MetaData = Map<String, Value>;

/// A provider of decoded detector events.
///
/// Implementors expose four parallel columns, one entry per event, plus the
/// metadata of the file they were read from. The extractor only ever reads
/// through this trait, so any decoder (FITS, in-memory fixtures, ...) can
/// feed it.
pub trait EventSource {
    /// Event timestamps in seconds since the Unix epoch.
    fn unix_time(&self) -> &[f64];
    /// Deposited energy in keV.
    fn energy(&self) -> &[f64];
    /// Board index and channel number.
    fn channel(&self) -> &[i64];
    /// Hardware trigger counter.
    fn trigger_count(&self) -> &[i64];
    /// Header keywords and other descriptive metadata.
    fn meta_data(&self) -> &MetaData;

    /// Number of rows in the timestamp column.
    fn len(&self) -> usize {
        self.unix_time().len()
    }

    /// Returns `true` if the source has no events.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An owned, in-memory set of event columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecordSet {
    pub unix_time: Vec<f64>,
    pub energy: Vec<f64>,
    pub channel: Vec<i64>,
    pub trigger_count: Vec<i64>,
    pub meta_data: MetaData,
}

impl EventRecordSet {
    /// Build a record set from its four columns with empty metadata.
    pub fn new(
        unix_time: Vec<f64>,
        energy: Vec<f64>,
        channel: Vec<i64>,
        trigger_count: Vec<i64>,
    ) -> Self {
        EventRecordSet {
            unix_time,
            energy,
            channel,
            trigger_count,
            meta_data: MetaData::new(),
        }
    }

    /// Attach metadata.
    pub fn with_meta_data(mut self, meta_data: MetaData) -> Self {
        self.meta_data = meta_data;
        self
    }
}

impl EventSource for EventRecordSet {
    fn unix_time(&self) -> &[f64] {
        &self.unix_time
    }

    fn energy(&self) -> &[f64] {
        &self.energy
    }

    fn channel(&self) -> &[i64] {
        &self.channel
    }

    fn trigger_count(&self) -> &[i64] {
        &self.trigger_count
    }

    fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_set_exposes_columns() {
        let events = EventRecordSet::new(
            vec![1.0, 2.0],
            vec![600.0, 700.0],
            vec![0, 1],
            vec![10, 11],
        );
        assert_eq!(events.len(), 2);
        assert!(!events.is_empty());
        assert_eq!(EventSource::channel(&events), &[0, 1]);
        assert_eq!(EventSource::trigger_count(&events), &[10, 11]);
        assert!(EventSource::meta_data(&events).is_empty());
    }

    #[test]
    fn default_is_empty() {
        assert!(EventRecordSet::default().is_empty());
    }

    #[test]
    fn with_meta_data_replaces_map() {
        let mut meta = MetaData::new();
        meta.insert("DET_ID".into(), json!("growth-fy2016a"));
        let events = EventRecordSet::default().with_meta_data(meta);
        assert_eq!(events.meta_data["DET_ID"], "growth-fy2016a");
    }
}
