//! Enrichment: derive analysis-ready fields from parsed records.

use crate::ingest::LogRecord;
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;

/// A [`LogRecord`] plus the fields derived from it.
///
/// Time-derived fields use the wall clock of the record's own UTC offset and
/// are all `None` when the timestamp is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: LogRecord,
    pub hour: Option<u32>,
    pub day: Option<NaiveDate>,
    pub weekday: Option<&'static str>,
    pub status_category: Option<u16>,
    /// Lowercased path; never null so substring checks need no special case.
    pub path_lower: String,
}

impl EnrichedRecord {
    pub fn from_record(record: LogRecord) -> Self {
        let (hour, day, weekday) = match record.timestamp {
            Some(ts) => (
                Some(ts.hour()),
                Some(ts.date_naive()),
                Some(weekday_name(ts.weekday())),
            ),
            None => (None, None, None),
        };
        let status_category = record.status.map(|status| status / 100);
        let path_lower = record.path.to_lowercase();

        Self {
            record,
            hour,
            day,
            weekday,
            status_category,
            path_lower,
        }
    }

    pub fn ip(&self) -> &str {
        &self.record.ip
    }

    pub fn path(&self) -> &str {
        &self.record.path
    }
}

/// Enrich every record, preserving count and order.
pub fn enrich(records: Vec<LogRecord>) -> Vec<EnrichedRecord> {
    records.into_iter().map(EnrichedRecord::from_record).collect()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
