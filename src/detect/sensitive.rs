//! Requests that touch credential, config or admin endpoints.

use super::{Finding, Signal};
use crate::enrich::EnrichedRecord;

/// Path fragments commonly probed by scanners.
pub const DEFAULT_SENSITIVE_PATHS: &[&str] = &[
    "/.env",
    "/wp-admin",
    "/wp-login",
    "/wp-login.php",
    "/admin",
    "/login",
    "/.git",
    "/.ds_store",
    "/etc/passwd",
    "/wp-config",
    "/wp-content",
    "/cgi-bin",
    "/secret",
    "/config",
    "/system",
    "/dashboard",
];

/// One finding per record whose lowercased path contains any fragment.
/// Matching is case-insensitive on both sides.
pub fn detect_sensitive_paths<S: AsRef<str>>(sorted: &[&EnrichedRecord], fragments: &[S]) -> Vec<Finding> {
    let fragments: Vec<String> = fragments.iter().map(|f| f.as_ref().to_lowercase()).collect();

    sorted
        .iter()
        .filter(|rec| fragments.iter().any(|f| rec.path_lower.contains(f.as_str())))
        .map(|rec| Finding {
            timestamp: rec.record.timestamp,
            ip: rec.ip().to_string(),
            path: rec.path().to_string(),
            signal: Signal::SensitivePath,
            score: 1,
        })
        .collect()
}
