//! IPs whose request volume is a statistical outlier.

use super::anomaly::CountSeries;
use super::{Finding, Signal};
use crate::enrich::EnrichedRecord;
use std::collections::BTreeMap;
use tracing::debug;

const SIGMAS: f64 = 3.0;

/// Flag IPs whose total request count is strictly above `mean + 3 * std_dev`
/// of all per-IP totals.
///
/// With zero or undefined deviation the threshold is the largest total, so
/// nothing can exceed it. Each finding points at the IP's first record in
/// `sorted` order.
pub fn detect_high_volume(sorted: &[&EnrichedRecord]) -> Vec<Finding> {
    let mut per_ip: BTreeMap<&str, (u64, &EnrichedRecord)> = BTreeMap::new();
    for &rec in sorted {
        per_ip.entry(rec.ip()).or_insert((0, rec)).0 += 1;
    }

    let series = CountSeries::new(per_ip.values().map(|(count, _)| *count));
    let Some(threshold) = series.outlier_threshold(SIGMAS) else {
        return Vec::new();
    };
    debug!(ips = series.len(), mean = series.mean(), threshold, "request volume baseline");

    per_ip
        .into_iter()
        .filter(|(_, (count, _))| *count as f64 > threshold)
        .map(|(ip, (count, first))| Finding {
            timestamp: first.record.timestamp,
            ip: ip.to_string(),
            path: first.path().to_string(),
            signal: Signal::HighVolume,
            score: count,
        })
        .collect()
}
