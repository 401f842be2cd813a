//! Access-log ingestion: line grammar, field typing and whole-file reading.
//!
//! Accepts the Apache/Nginx common and combined log formats:
//! `IP IDENT USER [DD/Mon/YYYY:HH:MM:SS +ZZZZ] "METHOD /path PROTO" STATUS SIZE ["REFERRER" "USER-AGENT"]`

pub mod decode;
pub mod record;

pub use decode::{decode_line, InputEncoding};
pub use record::LogRecord;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<ip>\S+)\s+(?P<identity>\S+)\s+(?P<auth_user>\S+)\s+\[(?P<timestamp>[^\]]+)\]\s+"(?P<method>\S+)\s+(?P<path>[^\s"]+)\s+(?P<protocol>[^"]+)"\s+(?P<status>\d{3}|000)\s+(?P<size>\S+)(?:\s+"(?P<referrer>[^"]*)"\s+"(?P<user_agent>[^"]*)")?"#,
    )
    .expect("access log regex is valid")
});

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Parse one raw line into a [`LogRecord`].
///
/// Returns `None` for empty lines and for lines that do not match the
/// grammar. A matched line always yields a record; malformed timestamp,
/// status or size values become `None` on the record instead.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    let line = line.trim_matches(|c| c == '\n' || c == '\r');
    if line.is_empty() {
        return None;
    }

    let caps = LOG_LINE.captures(line)?;
    let field = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

    Some(LogRecord {
        ip: field("ip")?,
        identity: field("identity")?,
        auth_user: field("auth_user")?,
        timestamp: parse_timestamp(caps.name("timestamp")?.as_str()),
        method: field("method")?,
        path: field("path")?,
        protocol: field("protocol")?,
        status: parse_status(caps.name("status")?.as_str()),
        size: parse_size(caps.name("size")?.as_str()),
        referrer: field("referrer"),
        user_agent: field("user_agent"),
    })
}

/// Parse every line, silently dropping the ones that do not match.
pub fn parse_lines<I, S>(lines: I) -> Vec<LogRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

fn parse_status(raw: &str) -> Option<u16> {
    raw.parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
}

fn parse_size(raw: &str) -> Option<u64> {
    match raw {
        "" | "-" => None,
        _ => raw.parse().ok(),
    }
}

/// Read a whole log from `reader`, decode each line and parse it.
///
/// Only I/O failures are errors; undecodable bytes and unmatched lines are
/// absorbed.
pub fn read_log_reader<R: Read>(mut reader: R, encoding: InputEncoding) -> Result<Vec<LogRecord>> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .context("failed to read log input")?;

    let mut total_lines = 0usize;
    let records: Vec<LogRecord> = buffer
        .split(|&b| b == b'\n')
        .inspect(|_| total_lines += 1)
        .filter_map(|raw| parse_line(&decode_line(raw, encoding)))
        .collect();

    info!(
        lines = total_lines,
        records = records.len(),
        bytes = buffer.len(),
        %encoding,
        "parsed access log"
    );
    Ok(records)
}

/// Read and parse the log file at `path`.
pub fn read_log_file(path: &Path, encoding: InputEncoding) -> Result<Vec<LogRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;
    read_log_reader(file, encoding)
        .with_context(|| format!("failed to load log file: {}", path.display()))
}
