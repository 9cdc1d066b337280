//! Tabular exports of audit results.
//!
//! Two CSV files per audit: one row per overlap group and one row per
//! work item with its cluster id (`-1` for noise).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ReportConfig;
use crate::error::{OverlapError, OverlapResult};
use crate::io::ReportSink;
use crate::overlap::{AuditReport, GroupFinding, ItemAssignment, QueryFinding};

const SUMMARY_HEADER: [&str; 7] = [
    "Cluster_ID",
    "Risk_Level",
    "Feature_Theme",
    "Teams_Involved",
    "Total_Tickets",
    "Overlapping_IDs",
    "Summary_Action",
];

const ASSIGNMENT_HEADER: [&str; 4] = ["ID", "Team", "Summary", "Cluster_ID"];

/// Quotes a field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| csv_field(f.as_ref())).collect();
    writeln!(out, "{}", line.join(","))
}

/// Writes one row per overlap group.
pub fn write_summary_csv<W: Write>(out: &mut W, findings: &[GroupFinding]) -> io::Result<()> {
    write_row(out, &SUMMARY_HEADER[..])?;
    for finding in findings {
        let group = &finding.group;
        let cluster = group
            .cluster()
            .map(|id| id.to_string())
            .unwrap_or_default();
        write_row(
            out,
            &[
                cluster,
                finding.assessment.level.to_string(),
                group.feature_theme().unwrap_or_default().to_string(),
                finding.assessment.teams.join(", "),
                group.len().to_string(),
                group.member_ids().join(", "),
                finding.assessment.action.clone(),
            ][..],
        )?;
    }
    Ok(())
}

/// Writes one row per work item, in corpus order.
pub fn write_assignments_csv<W: Write>(
    out: &mut W,
    assignments: &[ItemAssignment],
) -> io::Result<()> {
    write_row(out, &ASSIGNMENT_HEADER[..])?;
    for assignment in assignments {
        let cluster = assignment.cluster.as_export_value().to_string();
        write_row(
            out,
            &[
                assignment.id.as_str(),
                assignment.team.as_str(),
                assignment.summary.as_str(),
                cluster.as_str(),
            ][..],
        )?;
    }
    Ok(())
}

/// Report sink that writes the audit CSV files.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    summary_path: PathBuf,
    assignments_path: PathBuf,
}

impl CsvExporter {
    pub fn new(summary_path: impl Into<PathBuf>, assignments_path: impl Into<PathBuf>) -> Self {
        Self {
            summary_path: summary_path.into(),
            assignments_path: assignments_path.into(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.summary_csv, &config.assignments_csv)
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    pub fn assignments_path(&self) -> &Path {
        &self.assignments_path
    }

    fn write_file<F>(path: &Path, write: F) -> OverlapResult<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let result = (|| {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(path)?);
            write(&mut out)?;
            out.flush()
        })();
        result.map_err(|source| OverlapError::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ReportSink for CsvExporter {
    fn audit(&mut self, report: &AuditReport) -> OverlapResult<()> {
        let findings = report.findings()?;
        Self::write_file(&self.summary_path, |out| write_summary_csv(out, &findings))?;
        Self::write_file(&self.assignments_path, |out| {
            write_assignments_csv(out, &report.assignments)
        })?;
        info!(
            summary = %self.summary_path.display(),
            assignments = %self.assignments_path.display(),
            groups = findings.len(),
            "audit exported"
        );
        Ok(())
    }

    /// Queries have no tabular export.
    fn query(&mut self, _finding: &QueryFinding, _summary: &str) -> OverlapResult<()> {
        Ok(())
    }
}
