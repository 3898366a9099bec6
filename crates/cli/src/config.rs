//! Configuration management for the CLI

use anyhow::{Context, Result};
use risk_lib::AnalysisConfig;
use std::path::{Path, PathBuf};

/// Load the analysis configuration.
///
/// An explicit path must exist; otherwise the default path is used when
/// present. `VRISK_*` environment overrides always apply.
pub fn load(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => default_path().filter(|p| p.exists()),
    };

    AnalysisConfig::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load config from environment".to_string(),
    })
}

/// Get the default configuration file path
pub fn default_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("vrisk").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_path_location() {
        if let Some(path) = default_path() {
            assert!(path.ends_with(".config/vrisk/config.toml"));
        }
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let err = load(Some(Path::new("/nonexistent/vrisk.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "min_records = 12\nseasonal_period = 5").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.min_records, 12);
        assert_eq!(config.seasonal_period, 5);
    }
}
