//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::overlap::{GroupFinding, RiskLevel};
use crate::vector::StoreRecord;

/// Longest description shown in store listings.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 75;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        // Apply rounded corners
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Add a row of pre-styled cells.
    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Truncates `text` to `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max).collect();
    format!("{kept}...")
}

/// Overview of every overlap group found by an audit.
pub fn create_audit_summary_table(findings: &[GroupFinding]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["Cluster", "Risk", "Teams", "Tickets"]);

    for finding in findings {
        // comfy-table doesn't handle ANSI escapes well, color through cells
        let color = match finding.assessment.level {
            RiskLevel::High => Color::Red,
            RiskLevel::Medium => Color::Yellow,
        };
        let cluster = finding
            .group
            .cluster()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        builder = builder.add_cells(vec![
            Cell::new(cluster),
            Cell::new(finding.assessment.level)
                .fg(color)
                .add_attribute(Attribute::Bold),
            Cell::new(finding.assessment.teams.join(", ")),
            Cell::new(finding.group.len()),
        ]);
    }

    builder.build()
}

/// Store contents with descriptions cut to a preview.
pub fn create_store_table(records: &[StoreRecord]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["ID", "Team", "Summary", "Description"]);

    for record in records {
        let description = record
            .metadata
            .description
            .as_deref()
            .map(|d| truncate_chars(d, DESCRIPTION_PREVIEW_CHARS))
            .unwrap_or_default();
        builder = builder.add_row(vec![
            record.id.clone(),
            record.metadata.team.clone(),
            record.document.clone(),
            description,
        ]);
    }

    builder.build()
}
