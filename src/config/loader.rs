//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::CamoConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `camo.private_key`.
pub const PRIVATE_KEY_ENV_VAR: &str = "CAMO_PRIVATE_KEY";

/// Environment variable overriding `camo.base_url`.
pub const BASE_URL_ENV_VAR: &str = "CAMO_BASE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<CamoConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, |name| std::env::var(name).ok())
}

/// Defaults plus environment overrides, for running without a config file.
pub fn load_from_env() -> Result<CamoConfig, ConfigError> {
    finish(CamoConfig::default(), |name| std::env::var(name).ok())
}

/// Parse TOML and apply overrides from `lookup`.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<CamoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config: CamoConfig = toml::from_str(content)?;
    finish(config, lookup)
}

fn finish<F>(mut config: CamoConfig, lookup: F) -> Result<CamoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `CAMO_PRIVATE_KEY` / `CAMO_BASE_URL`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut CamoConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(PRIVATE_KEY_ENV_VAR).filter(|v| !v.is_empty()) {
        config.camo.private_key = key;
    }
    if let Some(base_url) = lookup(BASE_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        config.camo.base_url = base_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_with_overrides() {
        let config = parse_config(
            r#"
            [camo]
            base_url = "https://file.example/camo?action=camo"
            private_key = "from-file"
            "#,
            |name| match name {
                PRIVATE_KEY_ENV_VAR => Some("from-env".to_string()),
                _ => None,
            },
        )
        .unwrap();

        assert_eq!(config.camo.private_key, "from-env");
        assert_eq!(config.camo.base_url, "https://file.example/camo?action=camo");
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let config = parse_config("[camo]\nprivate_key = \"k\"", |_| Some(String::new())).unwrap();
        assert_eq!(config.camo.private_key, "k");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[camo\nbase_url = 1", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = parse_config(
            "[camo]\nbase_url = \"https://x/camo\"\n[timeouts]\nrequest_secs = 0",
            no_env,
        )
        .unwrap_err();

        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("timeouts.request_secs"));
        assert!(err.to_string().contains("camo.base_url"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camo]\ncache_hours = 12\n[access]\nallowed_groups = [3]").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.camo.cache_hours, 12);
        assert_eq!(config.access.allowed_groups, vec![3]);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
