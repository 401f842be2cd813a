use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One access-log request as matched by the line grammar.
///
/// Mandatory positional fields are always populated. Fields that matched the
/// grammar but failed type conversion (timestamp, status, size) are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub ip: String,
    pub identity: String,
    pub auth_user: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub status: Option<u16>,
    pub size: Option<u64>,
    /// Present together with `user_agent` (combined format) or not at all.
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl LogRecord {
    /// True for combined-format lines that carried the referrer/user-agent pair.
    pub fn is_combined(&self) -> bool {
        self.referrer.is_some() && self.user_agent.is_some()
    }
}
