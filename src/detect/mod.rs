//! Heuristic anomaly detection over enriched access-log records.

pub mod anomaly;
pub mod burst;
pub mod sensitive;
pub mod volume;

pub use sensitive::DEFAULT_SENSITIVE_PATHS;

use crate::enrich::EnrichedRecord;
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("insufficient baseline data: need {needed} samples, have {have}")]
    InsufficientBaseline { needed: usize, have: usize },
}

/// Which rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "burst_401_403")]
    Burst401403,
    #[serde(rename = "sensitive_path")]
    SensitivePath,
    #[serde(rename = "high_volume")]
    HighVolume,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Burst401403 => "burst_401_403",
            Signal::SensitivePath => "sensitive_path",
            Signal::HighVolume => "high_volume",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suspicious event. `score` is the error count in the window for bursts,
/// 1 for sensitive paths and the total request count for high volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub ip: String,
    pub path: String,
    pub signal: Signal,
    pub score: u64,
}

/// Tuning parameters for [`detect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// Minimum 401/403 responses inside one window to report a burst.
    pub error_threshold: usize,
    /// Burst window length.
    pub window_minutes: u32,
    /// Replaces [`DEFAULT_SENSITIVE_PATHS`] when set.
    pub sensitive_paths: Option<Vec<String>>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            error_threshold: 3,
            window_minutes: 1,
            sensitive_paths: None,
        }
    }
}

impl DetectOptions {
    pub fn window(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.window_minutes))
    }
}

/// Run all three rules and concatenate their findings: bursts, then
/// sensitive paths, then high volume.
///
/// Records are processed in timestamp order; records without a timestamp
/// sort first.
pub fn detect(records: &[EnrichedRecord], options: &DetectOptions) -> Vec<Finding> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&EnrichedRecord> = records.iter().collect();
    sorted.sort_by_key(|rec| rec.record.timestamp);

    let bursts = burst::detect_bursts(&sorted, options.error_threshold, options.window());
    let sensitive = match &options.sensitive_paths {
        Some(custom) => sensitive::detect_sensitive_paths(&sorted, custom),
        None => sensitive::detect_sensitive_paths(&sorted, DEFAULT_SENSITIVE_PATHS),
    };
    let high_volume = volume::detect_high_volume(&sorted);
    debug!(
        bursts = bursts.len(),
        sensitive = sensitive.len(),
        high_volume = high_volume.len(),
        "rule results"
    );

    let mut findings = bursts;
    findings.extend(sensitive);
    findings.extend(high_volume);
    info!(records = records.len(), findings = findings.len(), "anomaly detection complete");
    findings
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ingest::parse_line;

    /// Enriched record on 10 Oct 2023 UTC at `hms`.
    pub(crate) fn at(ip: &str, hms: &str, status: u16, path: &str) -> EnrichedRecord {
        let line = format!(r#"{ip} - - [10/Oct/2023:{hms} +0000] "GET {path} HTTP/1.1" {status} 100"#);
        EnrichedRecord::from_record(parse_line(&line).expect("fixture line should parse"))
    }

    pub(crate) fn sorted_refs(records: &[EnrichedRecord]) -> Vec<&EnrichedRecord> {
        let mut sorted: Vec<&EnrichedRecord> = records.iter().collect();
        sorted.sort_by_key(|rec| rec.record.timestamp);
        sorted
    }

    #[test]
    fn test_empty_input() {
        assert!(detect(&[], &DetectOptions::default()).is_empty());
    }

    #[test]
    fn test_rule_order_and_unsorted_input() {
        let records = vec![
            at("10.0.0.1", "13:00:20", 401, "/wp-admin"),
            at("10.0.0.1", "13:00:00", 401, "/wp-admin"),
            at("10.0.0.1", "13:00:10", 401, "/wp-admin"),
        ];
        let findings = detect(&records, &DetectOptions::default());

        assert_eq!(findings[0].signal, Signal::Burst401403);
        assert_eq!(findings[0].score, 3);
        assert_eq!(findings[0].timestamp, records[1].record.timestamp);
        assert!(findings[1..].iter().all(|f| f.signal == Signal::SensitivePath));
        assert_eq!(findings[1].timestamp, records[1].record.timestamp);
        assert!(findings.iter().all(|f| f.signal != Signal::HighVolume));
    }

    #[test]
    fn test_untimed_records_sort_first() {
        let mut untimed = at("2.2.2.2", "13:00:00", 200, "/admin/untimed");
        untimed.record.timestamp = None;
        let records = vec![at("1.1.1.1", "12:00:00", 200, "/admin/timed"), untimed];
        let findings = detect(&records, &DetectOptions::default());
        let paths: Vec<&str> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["/admin/untimed", "/admin/timed"]);
    }

    #[test]
    fn test_custom_sensitive_paths_replace_defaults() {
        let records = vec![at("1.1.1.1", "12:00:00", 200, "/wp-admin")];
        let options = DetectOptions {
            sensitive_paths: Some(vec!["/private".to_string()]),
            ..DetectOptions::default()
        };
        assert!(detect(&records, &options).is_empty());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::Burst401403.to_string(), "burst_401_403");
        assert_eq!(serde_json::to_string(&Signal::HighVolume).unwrap(), "\"high_volume\"");
    }
}
