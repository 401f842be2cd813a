//! Bursts of 401/403 responses from a single IP inside a sliding window.

use super::{Finding, Signal};
use crate::enrich::EnrichedRecord;
use chrono::{DateTime, FixedOffset, TimeDelta};
use std::collections::BTreeMap;

const ERROR_STATUSES: [u16; 2] = [401, 403];

/// Emit at most one finding per IP: the earliest window start whose
/// half-open window `[t, t + window)` holds at least `error_threshold`
/// error responses. Records without a timestamp are ignored.
///
/// `sorted` must be ordered by timestamp.
pub fn detect_bursts(sorted: &[&EnrichedRecord], error_threshold: usize, window: TimeDelta) -> Vec<Finding> {
    let mut by_ip: BTreeMap<&str, Vec<(DateTime<FixedOffset>, &EnrichedRecord)>> = BTreeMap::new();
    for &rec in sorted {
        if !rec.record.status.is_some_and(|s| ERROR_STATUSES.contains(&s)) {
            continue;
        }
        if let Some(ts) = rec.record.timestamp {
            by_ip.entry(rec.ip()).or_default().push((ts, rec));
        }
    }

    let mut findings = Vec::new();
    for (ip, events) in by_ip {
        for &(start, rec) in &events {
            let first = events.partition_point(|(t, _)| *t < start);
            let last = match start.checked_add_signed(window) {
                Some(end) => events.partition_point(|(t, _)| *t < end),
                None => events.len(),
            };
            let count = last - first;

            if count >= error_threshold {
                findings.push(Finding {
                    timestamp: Some(start),
                    ip: ip.to_string(),
                    path: rec.path().to_string(),
                    signal: Signal::Burst401403,
                    score: count as u64,
                });
                break;
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::tests::{at, sorted_refs};

    fn minute() -> TimeDelta {
        TimeDelta::minutes(1)
    }

    #[test]
    fn test_three_errors_in_window() {
        let records = vec![
            at("1.2.3.4", "13:00:00", 401, "/a"),
            at("1.2.3.4", "13:00:10", 401, "/b"),
            at("1.2.3.4", "13:00:20", 401, "/c"),
        ];
        let sorted = sorted_refs(&records);

        let findings = detect_bursts(&sorted, 3, minute());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score, 3);
        assert_eq!(findings[0].path, "/a");
        assert_eq!(findings[0].timestamp, records[0].record.timestamp);

        assert!(detect_bursts(&sorted, 4, minute()).is_empty());
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let records = vec![
            at("1.2.3.4", "13:00:00", 403, "/a"),
            at("1.2.3.4", "13:00:30", 403, "/b"),
            at("1.2.3.4", "13:01:00", 403, "/c"),
        ];
        let sorted = sorted_refs(&records);
        assert!(detect_bursts(&sorted, 3, minute()).is_empty());

        let findings = detect_bursts(&sorted, 2, minute());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score, 2);
        assert_eq!(findings[0].path, "/a");
    }

    #[test]
    fn test_later_window_start_and_one_finding_per_ip() {
        let records = vec![
            at("5.5.5.5", "12:00:00", 401, "/early"),
            at("5.5.5.5", "13:00:00", 401, "/x"),
            at("5.5.5.5", "13:00:05", 401, "/y"),
            at("5.5.5.5", "13:00:06", 403, "/z"),
            at("5.5.5.5", "13:00:07", 403, "/w"),
        ];
        let sorted = sorted_refs(&records);
        let findings = detect_bursts(&sorted, 3, minute());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "/x");
        assert_eq!(findings[0].score, 4);
    }

    #[test]
    fn test_non_error_and_untimed_records_are_ignored() {
        let mut untimed = at("1.2.3.4", "13:00:01", 401, "/u");
        untimed.record.timestamp = None;
        let records = vec![
            at("1.2.3.4", "13:00:00", 401, "/a"),
            untimed,
            at("1.2.3.4", "13:00:02", 404, "/b"),
            at("1.2.3.4", "13:00:03", 401, "/c"),
        ];
        let sorted = sorted_refs(&records);
        assert!(detect_bursts(&sorted, 3, minute()).is_empty());
        assert_eq!(detect_bursts(&sorted, 2, minute())[0].score, 2);
    }

    #[test]
    fn test_ips_are_counted_separately() {
        let records = vec![
            at("9.9.9.9", "13:00:00", 401, "/a"),
            at("1.1.1.1", "13:00:01", 401, "/a"),
            at("9.9.9.9", "13:00:02", 401, "/a"),
            at("1.1.1.1", "13:00:03", 401, "/a"),
        ];
        let sorted = sorted_refs(&records);
        let findings = detect_bursts(&sorted, 2, minute());
        let ips: Vec<&str> = findings.iter().map(|f| f.ip.as_str()).collect();
        assert_eq!(ips, ["1.1.1.1", "9.9.9.9"]);
        assert!(detect_bursts(&sorted, 3, minute()).is_empty());
    }
}
