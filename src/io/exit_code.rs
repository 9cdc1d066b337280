//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - the run completed, with or without overlaps found
//! - `1`: General error - unspecified failure
//! - `3-9`: One code per error kind so scripts can react precisely
//! - `126-255`: Reserved by shell

use crate::error::OverlapError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Record source missing or malformed (code 3)
    DataSourceError = 3,

    /// Embedding provider failed (code 4)
    EmbeddingError = 4,

    /// Vectors from different models were mixed (code 5)
    DimensionMismatch = 5,

    /// Bad configuration or invalid parameters (code 6)
    ConfigError = 6,

    /// Vector store unreachable and fallback disabled (code 7)
    StoreUnavailable = 7,

    /// Report could not be written (code 8)
    ReportError = 8,

    /// Store snapshot unreadable or corrupt (code 9)
    SnapshotError = 9,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert an `OverlapError` to the appropriate exit code.
    pub fn from_error(error: &OverlapError) -> Self {
        match error {
            OverlapError::DataSource { .. } => ExitCode::DataSourceError,
            OverlapError::Embedding { .. } => ExitCode::EmbeddingError,
            OverlapError::DimensionMismatch { .. } => ExitCode::DimensionMismatch,
            OverlapError::InvalidInput { .. } | OverlapError::Config { .. } => {
                ExitCode::ConfigError
            }
            OverlapError::StoreUnavailable { .. } => ExitCode::StoreUnavailable,
            OverlapError::Report { .. } => ExitCode::ReportError,
            OverlapError::Snapshot { .. } => ExitCode::SnapshotError,
        }
    }
}
