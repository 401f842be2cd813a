//! Aggregate traffic metrics for reporting.

use crate::enrich::EnrichedRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Overall traffic picture of one log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSummary {
    pub total_requests: usize,
    pub unique_ips: usize,
    /// Percentage of requests with a known status that were >= 400.
    pub error_rate_pct: f64,
    /// Keyed by hour of day; records without a timestamp are left out.
    pub requests_per_hour: BTreeMap<u32, usize>,
    pub status_categories: BTreeMap<u16, usize>,
    /// Most active IPs, busiest first.
    pub top_ips: Vec<IpCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpCount {
    pub ip: String,
    pub requests: usize,
}

impl TrafficSummary {
    pub fn from_records(records: &[EnrichedRecord], top_n: usize) -> Self {
        let mut per_ip: HashMap<&str, usize> = HashMap::new();
        let mut requests_per_hour: BTreeMap<u32, usize> = BTreeMap::new();
        let mut status_categories: BTreeMap<u16, usize> = BTreeMap::new();
        let mut with_status = 0usize;
        let mut errors = 0usize;

        for rec in records {
            *per_ip.entry(rec.ip()).or_default() += 1;
            if let Some(hour) = rec.hour {
                *requests_per_hour.entry(hour).or_default() += 1;
            }
            if let Some(category) = rec.status_category {
                *status_categories.entry(category).or_default() += 1;
            }
            if let Some(status) = rec.record.status {
                with_status += 1;
                if status >= 400 {
                    errors += 1;
                }
            }
        }

        let error_rate_pct = if with_status == 0 {
            0.0
        } else {
            errors as f64 / with_status as f64 * 100.0
        };

        let unique_ips = per_ip.len();
        let mut top_ips: Vec<IpCount> = per_ip
            .into_iter()
            .map(|(ip, requests)| IpCount {
                ip: ip.to_string(),
                requests,
            })
            .collect();
        top_ips.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.ip.cmp(&b.ip)));
        top_ips.truncate(top_n);

        Self {
            total_requests: records.len(),
            unique_ips,
            error_rate_pct,
            requests_per_hour,
            status_categories,
            top_ips,
        }
    }
}
