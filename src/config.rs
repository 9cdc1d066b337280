//! Configuration module for the overlap detection system.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SCOPESYNC_` and use double
//! underscores to separate nested levels:
//! - `SCOPESYNC_QUERY__K=5` sets `query.k`
//! - `SCOPESYNC_CLUSTERING__EPS=0.4` sets `clustering.eps`
//! - `SCOPESYNC_STORE__ENABLED=true` sets `store.enabled`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{OverlapError, OverlapResult};
use crate::vector::{DbscanParams, RetryPolicy};

/// Directory holding settings and the store snapshot.
pub const CONFIG_DIR: &str = ".scopesync";
const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SCOPESYNC_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Log filter directive, e.g. "info" or "scopesync=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where work items are read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Real-time query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Batch clustering settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Optional vector store
    #[serde(default)]
    pub store: StoreConfig,

    /// Export locations
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// JSON array or JSON Lines file of work items
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Model identifier, e.g. "AllMiniLML6V2"
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Summaries embedded per provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempts per provider call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, doubled afterwards
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Where model files are cached (defaults to the user cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

/// Parameters of the real-time overlap query.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Neighbours retrieved before thresholding
    #[serde(default = "default_k")]
    pub k: usize,

    /// Largest cosine distance reported as an overlap
    #[serde(default = "default_max_distance_threshold")]
    pub max_distance_threshold: f32,
}

/// Parameters of the batch cluster audit.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ClusteringConfig {
    /// Neighbourhood radius in cosine distance
    #[serde(default = "default_eps")]
    pub eps: f32,

    /// Smallest group reported as a cluster
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Worker threads for distance computation (0 = rayon default)
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Use the vector store for real-time queries
    #[serde(default = "default_false")]
    pub enabled: bool,

    /// Snapshot file of the in-memory store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Query the corpus directly when the store fails
    #[serde(default = "default_true")]
    pub fallback_to_brute_force: bool,

    /// Attempts per store call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// One row per overlap group
    #[serde(default = "default_summary_csv")]
    pub summary_csv: PathBuf,

    /// One row per work item with its cluster id
    #[serde(default = "default_assignments_csv")]
    pub assignments_csv: PathBuf,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_source_path() -> PathBuf {
    PathBuf::from("backlog.json")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_batch_size() -> usize {
    256
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    200
}
fn default_k() -> usize {
    10
}
fn default_max_distance_threshold() -> f32 {
    0.45
}
fn default_eps() -> f32 {
    0.55
}
fn default_min_cluster_size() -> usize {
    2
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_store_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("store.json")
}
fn default_summary_csv() -> PathBuf {
    PathBuf::from("overlap_summary_report.csv")
}
fn default_assignments_csv() -> PathBuf {
    PathBuf::from("similarity_report.csv")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            log_level: default_log_level(),
            source: SourceConfig::default(),
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
            clustering: ClusteringConfig::default(),
            store: StoreConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_distance_threshold: default_max_distance_threshold(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_cluster_size: default_min_cluster_size(),
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_store_path(),
            fallback_to_brute_force: true,
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            summary_csv: default_summary_csv(),
            assignments_csv: default_assignments_csv(),
        }
    }
}

impl EmbeddingConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
        )
    }
}

impl StoreConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(default_initial_backoff_ms()),
        )
    }
}

impl QueryConfig {
    /// Rejects `k == 0` and negative or non-finite thresholds.
    pub fn validate(&self) -> OverlapResult<()> {
        if self.k == 0 {
            return Err(OverlapError::invalid_input("query.k must be at least 1"));
        }
        if !self.max_distance_threshold.is_finite() || self.max_distance_threshold < 0.0 {
            return Err(OverlapError::invalid_input(format!(
                "query.max_distance_threshold must be a non-negative distance, got {}",
                self.max_distance_threshold
            )));
        }
        Ok(())
    }

    /// Minimum similarity a match must reach.
    pub fn similarity_threshold(&self) -> f32 {
        1.0 - self.max_distance_threshold
    }
}

impl ClusteringConfig {
    pub fn dbscan_params(&self) -> OverlapResult<DbscanParams> {
        Ok(DbscanParams::new(self.eps, self.min_cluster_size)?)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> OverlapResult<Self> {
        // Try to find the workspace root by looking for .scopesync directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file. A missing file leaves the
    /// defaults in place.
    pub fn load_from(path: impl AsRef<Path>) -> OverlapResult<Self> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single stays in names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| OverlapError::Config {
                reason: e.to_string(),
            })
    }

    /// Find the settings file by looking for a .scopesync directory,
    /// searching from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Checks every tunable for degenerate values.
    pub fn validate(&self) -> OverlapResult<()> {
        self.query.validate()?;
        self.clustering.dbscan_params()?;
        if self.embedding.batch_size == 0 {
            return Err(OverlapError::invalid_input(
                "embedding.batch_size must be at least 1",
            ));
        }
        if self.embedding.max_attempts == 0 || self.store.max_attempts == 0 {
            return Err(OverlapError::invalid_input(
                "max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Filter directive for the log subscriber.
    pub fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            self.log_level.as_str()
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> OverlapResult<()> {
        let path = path.as_ref();
        let write_err = |source: std::io::Error| OverlapError::Report {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let toml_string = toml::to_string_pretty(self).map_err(|e| OverlapError::Config {
            reason: e.to_string(),
        })?;
        std::fs::write(path, toml_string).map_err(write_err)
    }

    /// Create `.scopesync/settings.toml` in the current directory
    pub fn init_config_file(force: bool) -> OverlapResult<PathBuf> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file with helpful comments under `root`
    pub fn init_config_file_in(root: &Path, force: bool) -> OverlapResult<PathBuf> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err(OverlapError::Config {
                reason: format!(
                    "'{}' already exists. Use --force to overwrite",
                    config_path.display()
                ),
            });
        }

        let write_err = |source: std::io::Error| OverlapError::Report {
            path: config_path.clone(),
            source,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let template = format!(
            r#"# ScopeSync Configuration File

# Version of the configuration schema
version = 1

# Global debug mode (forces log_level = "debug")
debug = false

# Log filter, overridden by RUST_LOG
log_level = "warn"

[source]
# JSON array or JSON Lines file with id, team, summary, description
path = "backlog.json"

[embedding]
# Model identifier: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15,
# BGEBaseENV15, ParaphraseMLMiniLML12V2, MultilingualE5Small
model = "AllMiniLML6V2"
batch_size = 256
max_attempts = 3
initial_backoff_ms = 200
show_download_progress = true

[query]
# Neighbours retrieved before the threshold is applied
k = 10
# Cosine distance cut-off; similarity threshold is 1 - this value
max_distance_threshold = 0.45

[clustering]
# Neighbourhood radius in cosine distance
eps = 0.55
# Smallest group reported as an overlap (at least 2)
min_cluster_size = 2
# Worker threads for distance computation (defaults to CPU count)
# parallel_threads = {}

[store]
# Keep vectors in a snapshot for reuse between runs
enabled = false
path = ".scopesync/store.json"
# Query the corpus directly when the store cannot be read
fallback_to_brute_force = true
max_attempts = 3

[report]
summary_csv = "overlap_summary_report.csv"
assignments_csv = "similarity_report.csv"
"#,
            num_cpus::get()
        );

        std::fs::write(&config_path, template).map_err(write_err)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.query.k, 10);
        assert!((settings.query.max_distance_threshold - 0.45).abs() < f32::EPSILON);
        assert!((settings.clustering.eps - 0.55).abs() < f32::EPSILON);
        assert_eq!(settings.clustering.min_cluster_size, 2);
        assert!(settings.clustering.parallel_threads > 0);
        assert_eq!(settings.embedding.model, "AllMiniLML6V2");
        assert!(!settings.store.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
debug = true

[query]
k = 3
max_distance_threshold = 0.3

[clustering]
eps = 0.4
parallel_threads = 4

[store]
enabled = true
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.query.k, 3);
        assert_eq!(settings.clustering.parallel_threads, 4);
        assert!(settings.store.enabled);
        assert_eq!(settings.log_filter(), "debug");

        // Untouched values keep their defaults
        assert_eq!(settings.clustering.min_cluster_size, 2);
        assert_eq!(settings.embedding.batch_size, 256);
        assert!(settings.store.fallback_to_brute_force);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[report]\nsummary_csv = \"from_file.csv\"\n").unwrap();

        unsafe {
            std::env::set_var("SCOPESYNC_REPORT__ASSIGNMENTS_CSV", "from_env.csv");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("SCOPESYNC_REPORT__ASSIGNMENTS_CSV");
        }

        assert_eq!(settings.report.summary_csv, PathBuf::from("from_file.csv"));
        assert_eq!(
            settings.report.assignments_csv,
            PathBuf::from("from_env.csv")
        );
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.query.k = 4;
        settings.store.enabled = true;
        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.query.k, 4);
        assert!(loaded.store.enabled);
    }

    #[test]
    fn test_init_template_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = Settings::init_config_file_in(temp_dir.path(), false).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        let defaults = Settings::default();
        assert_eq!(loaded.query, defaults.query);
        assert_eq!(loaded.store, defaults.store);

        assert!(Settings::init_config_file_in(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file_in(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[query]\nk = \"ten\"\n").unwrap();

        assert!(matches!(
            Settings::load_from(&config_path),
            Err(OverlapError::Config { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let mut settings = Settings::default();
        settings.query.k = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.query.max_distance_threshold = f32::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.clustering.eps = -0.1;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.clustering.min_cluster_size = 0;
        assert!(matches!(
            settings.validate(),
            Err(OverlapError::InvalidInput { .. })
        ));

        let mut settings = Settings::default();
        settings.embedding.batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_similarity_threshold() {
        let config = QueryConfig {
            k: 10,
            max_distance_threshold: 0.45,
        };
        assert!((config.similarity_threshold() - 0.55).abs() < 1e-6);
    }
}
