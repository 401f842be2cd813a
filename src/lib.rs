//! accesswatch -- web-server access log analysis.
//!
//! This crate parses Apache/Nginx access logs, enriches the parsed records
//! with analysis fields and flags suspicious activity with three heuristic
//! rules: authentication-error bursts, sensitive-path probes and
//! request-volume outliers.

pub mod analysis;
pub mod config;
pub mod detect;
pub mod enrich;
pub mod export;
pub mod ingest;

use anyhow::Result;
use detect::{DetectOptions, Finding};
use enrich::EnrichedRecord;
use ingest::InputEncoding;
use serde::Serialize;
use std::path::Path;

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutput {
    pub records: Vec<EnrichedRecord>,
    pub findings: Vec<Finding>,
}

/// Run parse -> enrich -> detect over in-memory lines.
///
/// Never fails: unmatched lines are dropped and malformed fields become
/// nulls, so bad input only shrinks the output.
pub fn run_pipeline<I, S>(lines: I, options: &DetectOptions) -> PipelineOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let records = enrich::enrich(ingest::parse_lines(lines));
    let findings = detect::detect(&records, options);
    PipelineOutput { records, findings }
}

/// Run the full pipeline over the log file at `path`.
pub fn analyze_file(path: &Path, encoding: InputEncoding, options: &DetectOptions) -> Result<PipelineOutput> {
    tracing::info!(path = %path.display(), "reading access log");
    let records = enrich::enrich(ingest::read_log_file(path, encoding)?);
    let findings = detect::detect(&records, options);
    Ok(PipelineOutput { records, findings })
}
