//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use anyhow::Context;
use court_records::EngineConfig;

/// Env var naming a config file.
pub const CONFIG_ENV: &str = "COURT_RECORDS_CONFIG";
/// Env var overriding the portal base URL.
pub const BASE_URL_ENV: &str = "COURT_RECORDS_BASE_URL";
/// Config file picked up from the working directory.
pub const LOCAL_CONFIG: &str = "court-records.json";

/// Resolve the config file path: flag, then env var, then `./court-records.json`.
///
/// `None` means run on built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.trim().is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG);
    local.exists().then_some(local)
}

/// Load the engine config for this invocation.
///
/// The base URL is taken from `base_url` if given, else from
/// `COURT_RECORDS_BASE_URL`, else from the file or defaults.
pub fn load_config(explicit: Option<&str>, base_url: Option<&str>) -> anyhow::Result<EngineConfig> {
    let path = resolve_config_path(explicit);
    let base_url = base_url
        .map(str::to_string)
        .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|u| !u.trim().is_empty()));
    load_config_from(path.as_deref(), base_url)
}

/// Read `path` (or defaults) and apply a base URL override.
pub fn load_config_from(
    path: Option<&Path>,
    base_url: Option<String>,
) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };

    if let Some(url) = base_url {
        config.base_url = url;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some("/tmp/explicit.json"));
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.json")));
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config_from(None, None).unwrap();
        assert_eq!(config.sources.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base_url": "https://court.test", "sources": {{"courtindex": {{"limit": 5, "window_ms": 1000}}}}}}"#
        )
        .unwrap();

        let config = load_config_from(Some(file.path()), None).unwrap();
        assert_eq!(config.base_url, "https://court.test");
        assert_eq!(config.sources["courtindex"].limit, 5);
        assert_eq!(config.cache_ttl_secs, 300);
    }

    #[test]
    fn test_base_url_override() {
        let config = load_config_from(None, Some("http://127.0.0.1:9999".to_string())).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_bad_override_rejected() {
        assert!(load_config_from(None, Some("not a url".to_string())).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = load_config_from(Some(&missing), None).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
