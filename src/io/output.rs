//! Output management for CLI commands.
//!
//! Renders audit and query findings as styled text or as JSON envelopes,
//! and reports errors with their recovery suggestions.

use crate::display::{THEME, create_audit_summary_table, create_store_table};
use crate::error::{OverlapError, OverlapResult};
use crate::io::ReportSink;
use crate::io::exit_code::ExitCode;
use crate::io::format::{JsonResponse, OutputFormat};
use crate::overlap::{AuditReport, GroupFinding, ItemAssignment, QueryFinding};
use crate::vector::StoreRecord;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

const RULE_WIDTH: usize = 80;

/// JSON payload of an audit.
#[derive(Debug, Serialize)]
pub struct AuditOutput<'a> {
    pub groups: Vec<GroupFinding>,
    pub assignments: &'a [ItemAssignment],
    pub noise: usize,
}

/// JSON payload of a query.
#[derive(Debug, Serialize)]
pub struct QueryOutput<'a> {
    pub ticket: &'a str,
    #[serde(flatten)]
    pub finding: &'a QueryFinding,
}

/// Manages output formatting and display.
pub struct OutputManager {
    format: OutputFormat,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl OutputManager {
    /// Create a new output manager with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Create an output manager with custom writers.
    pub fn new_with_writers(
        format: OutputFormat,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            stdout,
            stderr,
        }
    }

    fn json<T: Serialize>(&mut self, response: &JsonResponse<T>) -> io::Result<()> {
        let text = serde_json::to_string_pretty(response)?;
        writeln!(self.stdout, "{text}")
    }

    /// Store listing for the `list` command.
    pub fn records(&mut self, records: &[StoreRecord]) -> OverlapResult<()> {
        let result = match self.format {
            OutputFormat::Json => self.json(&JsonResponse::success(records)),
            OutputFormat::Text if records.is_empty() => {
                writeln!(self.stdout, "{}", THEME.warning_with_icon("The vector store is empty."))
            }
            OutputFormat::Text => {
                writeln!(self.stdout, "{}", create_store_table(records)).and_then(|()| {
                    writeln!(self.stdout, "{} records", records.len())
                })
            }
        };
        result.map_err(stdout_error)
    }

    /// Output an error with suggestions.
    pub fn error(&mut self, error: &OverlapError) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::from_error(error);
                writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stderr, "{}", THEME.error_with_icon(&error.to_string()))?;
                for suggestion in error.recovery_suggestions() {
                    writeln!(self.stderr, "  Suggestion: {suggestion}")?;
                }
            }
        }
        Ok(ExitCode::from_error(error))
    }

    /// Output informational message (text mode only).
    pub fn info(&mut self, message: &str) -> io::Result<()> {
        if matches!(self.format, OutputFormat::Text) {
            writeln!(self.stdout, "{message}")?;
        }
        Ok(())
    }

    fn render_audit(&mut self, findings: &[GroupFinding]) -> io::Result<()> {
        let out = &mut self.stdout;
        if findings.is_empty() {
            return writeln!(
                out,
                "{}",
                THEME.success_with_icon(
                    "No significant semantic overlaps found. Backlogs appear clear."
                )
            );
        }

        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "{}", THEME.apply(&THEME.header, "SCOPESYNC OVERLAP AUDIT REPORT"))?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            out,
            "Found {} clusters of highly similar work.",
            THEME.apply(&THEME.number, findings.len())
        )?;
        writeln!(out, "{}", create_audit_summary_table(findings))?;

        for finding in findings {
            let group = &finding.group;
            let cluster = group
                .cluster()
                .map(|id| id.to_string())
                .unwrap_or_default();
            writeln!(out)?;
            writeln!(
                out,
                "{} | Risk: {}",
                THEME.apply(&THEME.emphasis, format!("Cluster {cluster}")),
                THEME.risk(finding.assessment.level)
            )?;
            writeln!(
                out,
                "Feature Theme:       {}",
                group.feature_theme().unwrap_or_default()
            )?;
            writeln!(out, "Teams Involved:      {}", finding.assessment.teams.join(", "))?;
            writeln!(out, "Action:              {}", finding.assessment.action)?;
            writeln!(
                out,
                "Overlapping Tickets: {}",
                THEME.apply(&THEME.id, group.member_ids().join(", "))
            )?;
            writeln!(out, "{}", "-".repeat(35))?;
        }
        Ok(())
    }

    fn render_query(&mut self, finding: &QueryFinding, ticket: &str) -> io::Result<()> {
        let out = &mut self.stdout;
        let Some(assessment) = &finding.assessment else {
            let threshold = finding.similarity_threshold;
            let message = format!(
                "No high-similarity overlap (>= {threshold:.2}) found for {ticket} \
                 in the existing backlog."
            );
            return writeln!(out, "{}", THEME.success_with_icon(&message));
        };

        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            out,
            "{}",
            THEME.warning_with_icon(&format!(
                "OVERLAP DETECTED (Similarity >= {:.2})",
                finding.similarity_threshold
            ))
        )?;
        writeln!(
            out,
            "New ticket {} by {} is highly similar to:",
            THEME.apply(&THEME.id, ticket),
            THEME.apply(&THEME.emphasis, &finding.query_team)
        )?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        if assessment.is_cross_team() {
            writeln!(
                out,
                "ACTION: {} with {}. {}",
                assessment.kind,
                assessment.teams.join(", "),
                THEME.risk(assessment.level)
            )?;
        } else {
            writeln!(
                out,
                "ACTION: {} within {}. {}",
                assessment.kind,
                finding.query_team,
                THEME.risk(assessment.level)
            )?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

        for m in &finding.matches {
            writeln!(
                out,
                "  - {} (Team: {})",
                THEME.apply(&THEME.id, &m.id),
                m.team
            )?;
            writeln!(
                out,
                "    - Similarity Score:  {}",
                THEME.apply(&THEME.number, format!("{:.3}", m.similarity))
            )?;
            writeln!(out, "    - Existing Summary:  {}", m.summary)?;
            writeln!(out, "    - Existing Context:  {}", m.context_snippet)?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))
    }
}

fn stdout_error(source: io::Error) -> OverlapError {
    OverlapError::Report {
        path: PathBuf::from("<stdout>"),
        source,
    }
}

impl ReportSink for OutputManager {
    fn audit(&mut self, report: &AuditReport) -> OverlapResult<()> {
        let findings = report.findings()?;
        let result = match self.format {
            OutputFormat::Json => {
                let groups = findings.len();
                let response = JsonResponse::success(AuditOutput {
                    groups: findings,
                    assignments: &report.assignments,
                    noise: report.noise_count(),
                })
                .with_message(format!("{groups} overlap groups"));
                self.json(&response)
            }
            OutputFormat::Text => self.render_audit(&findings),
        };
        result.map_err(stdout_error)
    }

    fn query(&mut self, finding: &QueryFinding, ticket: &str) -> OverlapResult<()> {
        let result = match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::success(QueryOutput { ticket, finding })
                    .with_message(format!("{} matches", finding.matches.len()));
                self.json(&response)
            }
            OutputFormat::Text => self.render_query(finding, ticket),
        };
        result.map_err(stdout_error)
    }
}
