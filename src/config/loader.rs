//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AuthType, RegistrarConfig};
use crate::config::secret_string;
use crate::domain::errors::RegistrarError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into RegistrarConfig
/// 4. Applies environment variable overrides (REGISTRAR_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use registrar::config::loader::load_config;
///
/// let config = load_config("registrar.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RegistrarConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RegistrarError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RegistrarError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut config = parse_config(&contents)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RegistrarError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Parses configuration text after `${VAR}` substitution, without validating
pub fn parse_config(contents: &str) -> Result<RegistrarConfig> {
    let contents = substitute_env_vars(contents)?;

    toml::from_str(&contents)
        .map_err(|e| RegistrarError::Configuration(format!("Failed to parse TOML: {e}")))
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RegistrarError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        RegistrarError::Configuration(format!("Invalid value '{raw}' for {name}"))
    })
}

/// Applies environment variable overrides using the REGISTRAR_* prefix
///
/// Variables follow the pattern `REGISTRAR_<SECTION>_<KEY>`, for example
/// `REGISTRAR_REGISTRY_BASE_URL` or `REGISTRAR_UPLOAD_CHUNK_SIZE_BYTES`.
fn apply_env_overrides(config: &mut RegistrarConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("REGISTRAR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Registry overrides
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_BASE_URL") {
        config.registry.base_url = val;
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_API_KEY") {
        config.registry.api_key = secret_string(val);
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_AUTH_TYPE") {
        config.registry.auth_type = match val.to_lowercase().as_str() {
            "basic" => AuthType::Basic,
            "bearer" => AuthType::Bearer,
            _ => {
                return Err(RegistrarError::Configuration(format!(
                    "Invalid value '{val}' for REGISTRAR_REGISTRY_AUTH_TYPE"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_TIMEOUT_SECONDS") {
        config.registry.timeout_seconds = parse_env("REGISTRAR_REGISTRY_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_TLS_VERIFY") {
        config.registry.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_RETRY_BASE_DELAY_SECS") {
        config.registry.retry.base_delay_secs =
            parse_env("REGISTRAR_REGISTRY_RETRY_BASE_DELAY_SECS", &val)?;
    }
    if let Ok(val) = std::env::var("REGISTRAR_REGISTRY_RETRY_MAX_RETRIES") {
        config.registry.retry.max_retries =
            Some(parse_env("REGISTRAR_REGISTRY_RETRY_MAX_RETRIES", &val)?);
    }

    // Upload overrides
    if let Ok(val) = std::env::var("REGISTRAR_UPLOAD_CHUNK_SIZE_BYTES") {
        config.upload.chunk_size_bytes = parse_env("REGISTRAR_UPLOAD_CHUNK_SIZE_BYTES", &val)?;
    }
    if let Ok(val) = std::env::var("REGISTRAR_UPLOAD_MAX_WAIT_SECS") {
        config.upload.max_wait_secs = Some(parse_env("REGISTRAR_UPLOAD_MAX_WAIT_SECS", &val)?);
    }

    // Task overrides
    if let Ok(val) = std::env::var("REGISTRAR_TASKS_POLL_INTERVAL_SECS") {
        config.tasks.poll_interval_secs = parse_env("REGISTRAR_TASKS_POLL_INTERVAL_SECS", &val)?;
    }
    if let Ok(val) = std::env::var("REGISTRAR_TASKS_MAX_WAIT_SECS") {
        config.tasks.max_wait_secs = Some(parse_env("REGISTRAR_TASKS_MAX_WAIT_SECS", &val)?);
    }

    // Sync overrides
    if let Ok(val) = std::env::var("REGISTRAR_SYNC_FOLDER_ID") {
        config.sync.folder_id = Some(val);
    }
    if let Ok(val) = std::env::var("REGISTRAR_SYNC_REGISTRY_ID") {
        config.sync.registry_id = Some(val);
    }
    if let Ok(val) = std::env::var("REGISTRAR_SYNC_COMPOSITE_SCHEMA_ID") {
        config.sync.composite_schema_id = Some(val);
    }
    if let Ok(val) = std::env::var("REGISTRAR_SYNC_COMPONENT_SCHEMA_ID") {
        config.sync.component_schema_id = Some(val);
    }

    // Results overrides
    if let Ok(val) = std::env::var("REGISTRAR_RESULTS_RUN_SCHEMA_ID") {
        config.results.run_schema_id = Some(val);
    }
    if let Ok(val) = std::env::var("REGISTRAR_RESULTS_RESULT_SCHEMA_ID") {
        config.results.result_schema_id = Some(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("REGISTRAR_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("REGISTRAR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[registry]
base_url = "https://example.benchling.com/api/v2"
api_key = "sk_unit_test"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("REGISTRAR_LOADER_TEST_KEY", "sk_from_env");
        let input = "api_key = \"${REGISTRAR_LOADER_TEST_KEY}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("sk_from_env"));
        std::env::remove_var("REGISTRAR_LOADER_TEST_KEY");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let input = "api_key = \"${REGISTRAR_LOADER_DEFINITELY_UNSET}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err
            .to_string()
            .contains("REGISTRAR_LOADER_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# api_key = \"${REGISTRAR_LOADER_COMMENTED_OUT}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${REGISTRAR_LOADER_COMMENTED_OUT}"));
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.registry.api_key.expose_secret(), "sk_unit_test");
        assert_eq!(config.registry.auth_type, AuthType::Basic);
        assert_eq!(config.upload.chunk_size_bytes, 10_000_000);
        assert_eq!(config.tasks.poll_interval_secs, 10);
        assert_eq!(config.registry.retry.base_delay_secs, 5);
        assert!(config.registry.retry.max_retries.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config("/nonexistent/registrar.toml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{MINIMAL}").unwrap();
        writeln!(file, "[upload]\nchunk_size_bytes = 5000000").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.upload.chunk_size_bytes, 5_000_000);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{MINIMAL}").unwrap();
        writeln!(file, "[application]\nlog_level = \"loud\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}
