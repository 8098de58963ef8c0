//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "registrar.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Registrar configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your tenant URL and ids", self.output);
                println!("  2. Put your API key in a .env file:");
                println!("     REGISTRAR_API_KEY=sk_...");
                println!("  3. Validate configuration: registrar validate-config");
                println!("  4. Register records: registrar sync antibodies.json");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Registrar Configuration File

[application]
log_level = "info"

[registry]
base_url = "https://example.benchling.com/api/v2"
api_key = "${REGISTRAR_API_KEY}"

[registry.retry]
base_delay_secs = 5

[upload]
chunk_size_bytes = 10000000

[tasks]
poll_interval_secs = 10

[sync]
folder_id = "lib_abc123"
registry_id = "src_def456"
composite_schema_id = "ts_antibody"
component_schema_id = "ts_chain"

[logging]
local_enabled = false
local_path = "/var/log/registrar"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Registrar Configuration File
#
# Values of the form ${VAR} are read from the environment (or a .env file).
# Any setting can also be overridden with REGISTRAR_<SECTION>_<KEY>, e.g.
# REGISTRAR_UPLOAD_CHUNK_SIZE_BYTES=5000000.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Registry API
# ============================================================================
[registry]
# Base URL of the API, including the version prefix
base_url = "https://example.benchling.com/api/v2"

# basic: API key as the username with an empty password
# bearer: Authorization: Bearer <api_key>
auth_type = "basic"

# API key (use an environment variable)
api_key = "${REGISTRAR_API_KEY}"

# Request timeout in seconds
timeout_seconds = 60

# TLS certificate verification (only disable for development servers)
tls_verify = true

[registry.retry]
# Rate-limited calls wait base, 2x base, 4x base, ... seconds between attempts
base_delay_secs = 5

# Give up after this many retries; remove to retry while throttled
max_retries = 8

# ============================================================================
# Blob Uploads
# ============================================================================
[upload]
# Files up to this size are sent in one request, larger files in parts
chunk_size_bytes = 10000000

# Recorded on the blob
mime_type = "application/octet-stream"

# RAW_FILE or VISUALIZATION
blob_type = "RAW_FILE"

# Seconds between checks of a blob that is still IN_PROGRESS
status_poll_interval_secs = 5

# Stop waiting for an IN_PROGRESS blob after this many seconds; remove to
# wait until the server settles it
max_wait_secs = 600

# ============================================================================
# Asynchronous Tasks
# ============================================================================
[tasks]
# Seconds between task status checks
poll_interval_secs = 10

# Stop waiting for a task after this many seconds; remove to wait forever
max_wait_secs = 3600

# ============================================================================
# Record Sync
# ============================================================================
[sync]
# Where new entities are created and registered. These can also be given
# on the command line with --folder-id, --registry-id, ...
folder_id = "lib_abc123"
registry_id = "src_def456"
composite_schema_id = "ts_antibody"
component_schema_id = "ts_chain"

# Key of the records array in the input document
records_key = "antibodies"

# Record fields holding component sequences
component_fields = ["Heavy Chain", "Light Chain"]

# Naming strategy used when registering
naming_strategy = "NEW_IDS"

# Field holding a registered entity's registry identity
registry_field = "entityRegistryId"

# ============================================================================
# Assay Results
# ============================================================================
[results]
# Schemas for upload-results; also accepted as --run-schema-id and
# --result-schema-id
run_schema_id = "assaysch_run123"
result_schema_id = "assaysch_res456"

# Key of the results array in the input document
results_key = "results"

# Result field linking each result to the created run
run_field = "run"

# ============================================================================
# Logging
# ============================================================================
[logging]
# Write JSON logs to rotating files
local_enabled = false
local_path = "/var/log/registrar"

# daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
