//! Configuration schema types
//!
//! This module defines the configuration structure for Registrar.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main Registrar configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Registry API connection
    pub registry: RegistryConfig,

    /// Blob upload settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Asynchronous task polling
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Identifiers and field mapping for record sync
    #[serde(default)]
    pub sync: SyncConfig,

    /// Schemas and field mapping for assay result uploads
    #[serde(default)]
    pub results: ResultsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RegistrarConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.registry.validate()?;
        self.upload.validate()?;
        self.tasks.validate()?;
        self.sync.validate()?;
        self.results.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// How the API key is presented to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// HTTP basic auth with the API key as username and an empty password
    #[default]
    Basic,
    /// `Authorization: Bearer <api_key>`
    Bearer,
}

/// Retry configuration for rate-limited calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay `k` in seconds; the n-th retry waits `k * 2^(n-1)`
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Maximum number of retries; absent means retry for as long as the
    /// server keeps throttling
    #[serde(default)]
    pub max_retries: Option<usize>,
}

impl RetryConfig {
    /// Base delay as a `Duration`
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay_secs(),
            max_retries: None,
        }
    }
}

/// Registry API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the API, e.g. `https://example.benchling.com/api/v2`
    pub base_url: String,

    /// Authentication scheme
    #[serde(default)]
    pub auth_type: AuthType,

    /// API key
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    ///
    /// **SECURITY WARNING**: only disable against development servers.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("registry.base_url cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("registry.base_url is not a valid URL: {e}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("registry.base_url must start with http:// or https://".to_string());
        }

        if self.api_key.expose_secret().is_empty() {
            return Err("registry.api_key cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("registry.timeout_seconds must be greater than 0".to_string());
        }

        if self.retry.base_delay_secs == 0 {
            return Err("registry.retry.base_delay_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Blob upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest part sent in one request; payloads at or below this size
    /// are uploaded in a single call
    #[serde(default = "default_chunk_size_bytes")]
    pub chunk_size_bytes: usize,

    /// MIME type recorded on the blob
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Blob type (RAW_FILE or VISUALIZATION)
    #[serde(default = "default_blob_type")]
    pub blob_type: String,

    /// Interval between upload status checks, in seconds
    #[serde(default = "default_status_poll_interval_secs")]
    pub status_poll_interval_secs: u64,

    /// Give up waiting on a blob stuck in progress after this many seconds;
    /// absent means wait until the server settles it
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl UploadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size_bytes < MIN_CHUNK_SIZE_BYTES {
            return Err(format!(
                "upload.chunk_size_bytes must be at least {MIN_CHUNK_SIZE_BYTES}, got {}",
                self.chunk_size_bytes
            ));
        }

        let valid_types = ["RAW_FILE", "VISUALIZATION"];
        if !valid_types.contains(&self.blob_type.as_str()) {
            return Err(format!(
                "Invalid upload.blob_type '{}'. Must be one of: {}",
                self.blob_type,
                valid_types.join(", ")
            ));
        }

        if self.mime_type.trim().is_empty() {
            return Err("upload.mime_type cannot be empty".to_string());
        }

        if self.max_wait_secs == Some(0) {
            return Err("upload.max_wait_secs must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    /// Status poll interval as a `Duration`
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs)
    }

    /// Maximum wait on a blob's status as a `Duration`
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size_bytes(),
            mime_type: default_mime_type(),
            blob_type: default_blob_type(),
            status_poll_interval_secs: default_status_poll_interval_secs(),
            max_wait_secs: None,
        }
    }
}

/// Asynchronous task polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Interval between task status checks, in seconds
    #[serde(default = "default_task_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up waiting on a task after this many seconds; absent means wait
    /// until the task finishes
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl TaskConfig {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs == 0 {
            return Err("tasks.poll_interval_secs must be greater than 0".to_string());
        }
        if self.max_wait_secs == Some(0) {
            return Err("tasks.max_wait_secs must be greater than 0 when set".to_string());
        }
        Ok(())
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Maximum wait as a `Duration`
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_task_poll_interval_secs(),
            max_wait_secs: None,
        }
    }
}

/// Record sync configuration
///
/// Identifiers may be left out of the file and supplied on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Folder new entities are created in
    #[serde(default)]
    pub folder_id: Option<String>,

    /// Registry entities are registered into
    #[serde(default)]
    pub registry_id: Option<String>,

    /// Schema of the composite record (e.g. Antibody)
    #[serde(default)]
    pub composite_schema_id: Option<String>,

    /// Schema of the dependent component records (an AA-sequence schema)
    #[serde(default)]
    pub component_schema_id: Option<String>,

    /// Top-level key of the records array in the input document
    #[serde(default = "default_records_key")]
    pub records_key: String,

    /// Record fields holding component sequences; each becomes a dependent
    /// record and a field of the same name on the composite
    #[serde(default = "default_component_fields")]
    pub component_fields: Vec<String>,

    /// Naming strategy used when registering
    #[serde(default = "default_naming_strategy")]
    pub naming_strategy: String,

    /// Field carrying a registered entity's registry identity
    #[serde(default = "default_registry_field")]
    pub registry_field: String,
}

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if self.records_key.trim().is_empty() {
            return Err("sync.records_key cannot be empty".to_string());
        }

        if self.component_fields.is_empty() {
            return Err("sync.component_fields cannot be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.component_fields {
            if !seen.insert(field.as_str()) {
                return Err(format!("sync.component_fields contains '{field}' twice"));
            }
        }

        let valid_strategies = [
            "NEW_IDS",
            "IDS_FROM_NAMES",
            "DELETE_NAMES",
            "SET_FROM_NAME_PARTS",
            "REPLACE_NAMES_FROM_PARTS",
            "KEEP_NAMES",
        ];
        if !valid_strategies.contains(&self.naming_strategy.as_str()) {
            return Err(format!(
                "Invalid sync.naming_strategy '{}'. Must be one of: {}",
                self.naming_strategy,
                valid_strategies.join(", ")
            ));
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            folder_id: None,
            registry_id: None,
            composite_schema_id: None,
            component_schema_id: None,
            records_key: default_records_key(),
            component_fields: default_component_fields(),
            naming_strategy: default_naming_strategy(),
            registry_field: default_registry_field(),
        }
    }
}

/// Assay result upload configuration
///
/// Schema ids may be left out of the file and supplied on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Schema of the assay run created for each upload
    #[serde(default)]
    pub run_schema_id: Option<String>,

    /// Schema of the uploaded results
    #[serde(default)]
    pub result_schema_id: Option<String>,

    /// Top-level key of the results array in the input document
    #[serde(default = "default_results_key")]
    pub results_key: String,

    /// Result field that links each result to its run
    #[serde(default = "default_run_field")]
    pub run_field: String,
}

impl ResultsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.results_key.trim().is_empty() {
            return Err("results.results_key cannot be empty".to_string());
        }
        if self.run_field.trim().is_empty() {
            return Err("results.run_field cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            run_schema_id: None,
            result_schema_id: None,
            results_key: default_results_key(),
            run_field: default_run_field(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rotating files
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation policy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

/// Smallest accepted chunk size
pub const MIN_CHUNK_SIZE_BYTES: usize = 1024;

/// Part size limit the blob API enforces
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 10_000_000;

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_base_delay_secs() -> u64 {
    5
}

fn default_chunk_size_bytes() -> usize {
    DEFAULT_CHUNK_SIZE_BYTES
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

fn default_blob_type() -> String {
    "RAW_FILE".to_string()
}

fn default_status_poll_interval_secs() -> u64 {
    5
}

fn default_task_poll_interval_secs() -> u64 {
    10
}

fn default_records_key() -> String {
    "antibodies".to_string()
}

fn default_component_fields() -> Vec<String> {
    vec!["Heavy Chain".to_string(), "Light Chain".to_string()]
}

fn default_naming_strategy() -> String {
    "NEW_IDS".to_string()
}

fn default_registry_field() -> String {
    "entityRegistryId".to_string()
}

fn default_results_key() -> String {
    "results".to_string()
}

fn default_run_field() -> String {
    "run".to_string()
}

fn default_local_path() -> String {
    "/var/log/registrar".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
