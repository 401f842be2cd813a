//! CSV export of enriched records and findings.
//!
//! Column orders are fixed. Missing values are written as empty cells,
//! timestamps as RFC 3339 and days as `YYYY-MM-DD`.

use crate::detect::Finding;
use crate::enrich::EnrichedRecord;
use crate::PipelineOutput;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const RECORD_COLUMNS: [&str; 16] = [
    "ip",
    "identity",
    "auth_user",
    "timestamp",
    "method",
    "path",
    "protocol",
    "status",
    "size",
    "referrer",
    "user_agent",
    "hour",
    "day",
    "weekday",
    "status_category",
    "path_lower",
];

pub const FINDING_COLUMNS: [&str; 5] = ["timestamp", "ip", "path", "signal", "score"];

pub const RECORDS_FILE: &str = "processed.csv";
pub const FINDINGS_FILE: &str = "findings.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: Box<ExportError>,
    },

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths written by [`save_outputs`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub records: PathBuf,
    pub findings: PathBuf,
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_records_csv<W: Write>(writer: W, records: &[EnrichedRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RECORD_COLUMNS)?;

    for rec in records {
        let base = &rec.record;
        wtr.write_record([
            base.ip.clone(),
            base.identity.clone(),
            base.auth_user.clone(),
            opt(base.timestamp.map(|ts| ts.to_rfc3339())),
            base.method.clone(),
            base.path.clone(),
            base.protocol.clone(),
            opt(base.status),
            opt(base.size),
            base.referrer.clone().unwrap_or_default(),
            base.user_agent.clone().unwrap_or_default(),
            opt(rec.hour),
            opt(rec.day),
            opt(rec.weekday),
            opt(rec.status_category),
            rec.path_lower.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write findings; the header is written even when there are none.
pub fn write_findings_csv<W: Write>(writer: W, findings: &[Finding]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(FINDING_COLUMNS)?;

    for finding in findings {
        wtr.write_record([
            opt(finding.timestamp.map(|ts| ts.to_rfc3339())),
            finding.ip.clone(),
            finding.path.clone(),
            finding.signal.to_string(),
            finding.score.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(std::fs::File) -> Result<(), ExportError>,
{
    std::fs::File::create(path)
        .map_err(ExportError::from)
        .and_then(write)
        .map_err(|e| ExportError::WriteFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
}

/// Create `outdir` if needed and write `processed.csv` and `findings.csv`.
pub fn save_outputs(outdir: &Path, output: &PipelineOutput) -> Result<OutputPaths, ExportError> {
    std::fs::create_dir_all(outdir).map_err(|source| ExportError::CreateDir {
        path: outdir.to_path_buf(),
        source,
    })?;

    let paths = OutputPaths {
        records: outdir.join(RECORDS_FILE),
        findings: outdir.join(FINDINGS_FILE),
    };
    write_file(&paths.records, |f| write_records_csv(f, &output.records))?;
    info!(path = %paths.records.display(), rows = output.records.len(), "processed data saved");
    write_file(&paths.findings, |f| write_findings_csv(f, &output.findings))?;
    info!(path = %paths.findings.display(), rows = output.findings.len(), "findings saved");

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Signal;
    use crate::enrich::enrich;
    use crate::ingest::parse_lines;

    fn to_string<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), ExportError>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_findings_keep_header() {
        let out = to_string(|buf| write_findings_csv(buf, &[]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, ["timestamp,ip,path,signal,score"]);
    }

    #[test]
    fn test_empty_records_keep_header() {
        let out = to_string(|buf| write_records_csv(buf, &[]));
        assert_eq!(out.lines().count(), 1);
        assert_eq!(out.lines().next().unwrap(), RECORD_COLUMNS.join(","));
    }

    #[test]
    fn test_record_row_formatting() {
        let records = enrich(parse_lines([
            r#"10.0.0.1 - - [10/Oct/2023:13:00:00 -0700] "GET /Login HTTP/1.1" 200 - "-" "curl/8.0, beta""#,
            r#"10.0.0.2 - - [garbage] "GET / HTTP/1.1" 404 12"#,
        ]));
        let out = to_string(|buf| write_records_csv(buf, &records));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#"10.0.0.1,-,-,2023-10-10T13:00:00-07:00,GET,/Login,HTTP/1.1,200,,-,"curl/8.0, beta",13,2023-10-10,Tuesday,2,/login"#
        );
        assert_eq!(lines[2], "10.0.0.2,-,-,,GET,/,HTTP/1.1,404,12,,,,,,4,/");
    }

    #[test]
    fn test_finding_row_formatting() {
        let finding = Finding {
            timestamp: None,
            ip: "1.2.3.4".to_string(),
            path: "/.env".to_string(),
            signal: Signal::SensitivePath,
            score: 1,
        };
        let out = to_string(|buf| write_findings_csv(buf, &[finding]));
        assert_eq!(out.lines().nth(1), Some(",1.2.3.4,/.env,sensitive_path,1"));
    }

    #[test]
    fn test_save_outputs_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let outdir = dir.path().join("nested").join("out");
        let output = PipelineOutput::default();

        let paths = save_outputs(&outdir, &output).unwrap();
        assert!(paths.records.exists());
        let findings = std::fs::read_to_string(&paths.findings).unwrap();
        assert_eq!(findings.trim_end(), "timestamp,ip,path,signal,score");
    }
}
