use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SETTINGS_FILE: &str = "jsreport-migration.toml";

/// Tunables for one migration run, read from an optional file in the project.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Version range the installed v1 project must satisfy.
    #[serde(default = "default_required_version")]
    pub required_version: String,

    #[serde(default = "default_target_package")]
    pub target_package: String,

    /// Document store location, relative to the project directory.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_npm_command")]
    pub npm_command: String,

    /// Maximum concurrent store writes inside one step.
    #[serde(default = "default_batch_fanout")]
    pub batch_fanout: usize,
}

fn default_required_version() -> String {
    "1.10.x".to_string()
}
fn default_target_package() -> String {
    "jsreport@2.x.x".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("data").join("jsreport.db")
}
fn default_npm_command() -> String {
    "npm".to_string()
}
fn default_batch_fanout() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            required_version: default_required_version(),
            target_package: default_target_package(),
            store_path: default_store_path(),
            npm_command: default_npm_command(),
            batch_fanout: default_batch_fanout(),
        }
    }
}

impl Settings {
    pub async fn load<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let path = project_dir.as_ref().join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;

        if settings.batch_fanout == 0 {
            settings.batch_fanout = 1;
        }

        info!(
            "Loaded migration settings: required={}, target={}, store={}, fanout={}",
            settings.required_version,
            settings.target_package,
            settings.store_path.display(),
            settings.batch_fanout
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_latest_v1() {
        let settings = Settings::default();
        assert_eq!(settings.required_version, "1.10.x");
        assert_eq!(settings.target_package, "jsreport@2.x.x");
        assert_eq!(settings.store_path, PathBuf::from("data/jsreport.db"));
        assert_eq!(settings.npm_command, "npm");
        assert_eq!(settings.batch_fanout, 8);
    }

    #[tokio::test]
    async fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).await.unwrap();
        assert_eq!(settings.batch_fanout, 8);
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "store_path = \"db/store.sqlite\"\nbatch_fanout = 0\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).await.unwrap();
        assert_eq!(settings.store_path, PathBuf::from("db/store.sqlite"));
        assert_eq!(settings.batch_fanout, 1);
        assert_eq!(settings.npm_command, "npm");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "batch_fanout = \"many\"").unwrap();
        let err = Settings::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
    }
}
