use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::upload::UploadDir;

pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub listen: String,
    pub database_path: String,
    pub uploads_dir: String,
    pub max_upload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
            database_path: "./roster.sqlite3".to_string(),
            uploads_dir: "./static/uploads".to_string(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl Config {
    /// Reads `path`, or writes the defaults there when it doesn't exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
        } else {
            let default_config = Config::default();
            let toml_string = toml::to_string_pretty(&default_config)
                .context("failed to serialize default config")?;
            std::fs::write(path, toml_string)
                .with_context(|| format!("failed to create {}", path.display()))?;
            log::info!("wrote default configuration to {}", path.display());
            Ok(default_config)
        }
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ROSTER_LISTEN") {
            self.listen = v;
        }
        if let Some(v) = lookup("ROSTER_DATABASE") {
            self.database_path = v;
        }
        if let Some(v) = lookup("ROSTER_UPLOADS_DIR") {
            self.uploads_dir = v;
        }
        if let Some(v) = lookup("ROSTER_MAX_UPLOAD_SIZE") {
            match v.parse() {
                Ok(n) => self.max_upload_size = n,
                Err(_) => log::warn!("ignoring ROSTER_MAX_UPLOAD_SIZE={v:?}: not an integer"),
            }
        }
        self
    }

    pub fn from_env_config() -> anyhow::Result<Self> {
        let path = std::env::var("ROSTER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let final_cfg = Self::load(Path::new(&path))?.apply_overrides(|k| std::env::var(k).ok());
        final_cfg
            .upload_dir()
            .ensure()
            .with_context(|| format!("failed to create uploads dir {}", final_cfg.uploads_dir))?;
        Ok(final_cfg)
    }

    pub fn upload_dir(&self) -> UploadDir {
        UploadDir::new(&self.uploads_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.max_upload_size, 16 * 1024 * 1024);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("uploads_dir"));
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "listen = \"0.0.0.0:8080\"\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.listen, "0.0.0.0:8080");
        assert_eq!(cfg.database_path, Config::default().database_path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "listen = [").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("ROSTER_DATABASE", "/tmp/other.sqlite3"),
            ("ROSTER_MAX_UPLOAD_SIZE", "1024"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::default().apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.database_path, "/tmp/other.sqlite3");
        assert_eq!(cfg.max_upload_size, 1024);
        assert_eq!(cfg.listen, Config::default().listen);
    }

    #[test]
    fn bad_size_override_is_ignored() {
        let cfg = Config::default().apply_overrides(|k| {
            (k == "ROSTER_MAX_UPLOAD_SIZE").then(|| "lots".to_string())
        });
        assert_eq!(cfg.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
    }
}
