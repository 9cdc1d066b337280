//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - The [`ReportSink`] contract for rendering findings
//! - Console output (text, JSON) and CSV exports
//! - Consistent error handling and exit codes

pub mod exit_code;
pub mod export;
pub mod format;
pub mod output;

pub use exit_code::ExitCode;
pub use export::{CsvExporter, write_assignments_csv, write_summary_csv};
pub use format::{ErrorDetails, JsonResponse, OutputFormat};
pub use output::OutputManager;

use crate::error::OverlapResult;
use crate::overlap::{AuditReport, QueryFinding};

/// Consumes findings and renders or exports them.
///
/// Sinks only present data; they never change classification.
pub trait ReportSink {
    /// Renders the result of a batch audit.
    fn audit(&mut self, report: &AuditReport) -> OverlapResult<()>;

    /// Renders the result of a real-time query for `ticket`.
    fn query(&mut self, finding: &QueryFinding, ticket: &str) -> OverlapResult<()>;
}
