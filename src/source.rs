//! Record sources: where work items come from before they are embedded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::corpus::WorkItemRecord;
use crate::error::{OverlapError, OverlapResult};

/// Supplies work items in a stable order.
pub trait RecordSource {
    /// Reads every record. Fails on a missing or malformed source; never
    /// returns a partial sequence.
    fn load(&self) -> OverlapResult<Vec<WorkItemRecord>>;
}

/// File source for a JSON array or, with a `.jsonl` / `.ndjson`
/// extension, one JSON object per line.
///
/// Field names may be lowercase (`id`, `team`, `summary`, `description`)
/// or the tracker export headers (`JIRA_ID`, `TEAM`, `SUMMARY`,
/// `DESCRIPTION`).
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json_lines(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("jsonl" | "ndjson")
        )
    }

    fn error(&self, reason: impl Into<String>) -> OverlapError {
        OverlapError::DataSource {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn parse_lines(&self, content: &str) -> OverlapResult<Vec<WorkItemRecord>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line)
                    .map_err(|e| self.error(format!("line {}: {e}", index + 1)))
            })
            .collect()
    }
}

impl RecordSource for JsonRecordSource {
    fn load(&self) -> OverlapResult<Vec<WorkItemRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e.to_string()))?;

        let records: Vec<WorkItemRecord> = if self.is_json_lines() {
            self.parse_lines(&content)?
        } else {
            serde_json::from_str(&content).map_err(|e| self.error(e.to_string()))?
        };

        for (index, record) in records.iter().enumerate() {
            let missing = [
                ("id", &record.id),
                ("team", &record.team),
                ("summary", &record.summary),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());
            if let Some((field, _)) = missing {
                return Err(self.error(format!("record {} has an empty '{field}'", index + 1)));
            }
        }

        debug!(path = %self.path.display(), records = records.len(), "loaded work items");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backlog.json");
        fs::write(
            &path,
            r#"[
                {"JIRA_ID": "NOVA-1", "TEAM": "Nova", "SUMMARY": "Reset password", "DESCRIPTION": "Users forget."},
                {"id": "ATL-2", "team": "Atlas", "summary": "Billing export"}
            ]"#,
        )
        .unwrap();

        let records = JsonRecordSource::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "NOVA-1");
        assert_eq!(records[0].description.as_deref(), Some("Users forget."));
        assert_eq!(records[1].team, "Atlas");
    }

    #[test]
    fn test_load_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backlog.jsonl");
        fs::write(
            &path,
            "{\"id\": \"A\", \"team\": \"Nova\", \"summary\": \"x\"}\n\n{\"id\": \"B\", \"team\": \"Atlas\", \"summary\": \"y\"}\n",
        )
        .unwrap();

        let ids: Vec<String> = JsonRecordSource::new(&path)
            .load()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = JsonRecordSource::new(temp_dir.path().join("absent.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, OverlapError::DataSource { .. }));
    }

    #[test]
    fn test_missing_column_is_data_source_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backlog.json");
        fs::write(&path, r#"[{"id": "A", "summary": "no team"}]"#).unwrap();
        assert!(matches!(
            JsonRecordSource::new(&path).load(),
            Err(OverlapError::DataSource { .. })
        ));

        fs::write(&path, r#"[{"id": "A", "team": " ", "summary": "blank team"}]"#).unwrap();
        let err = JsonRecordSource::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("'team'"));
    }
}
