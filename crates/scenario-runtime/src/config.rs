//! Application configuration loaded from YAML.

use crate::coordinator::DEFAULT_DEBOUNCE;
use crate::save::DEFAULT_STATUS_TTL_MS;
use crate::service::{
    AnyCalculationService, CalculationError, HttpCalculationService, LocalCalculationService,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "profitengine.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {reason}")]
    Invalid { path: String, reason: String },
}

/// Where calculations are performed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceConfig {
    #[default]
    Local,
    Http {
        base_url: String,
    },
}

impl ServiceConfig {
    pub fn build(&self) -> Result<AnyCalculationService, CalculationError> {
        match self {
            ServiceConfig::Local => Ok(AnyCalculationService::Local(LocalCalculationService)),
            ServiceConfig::Http { base_url } => {
                Ok(AnyCalculationService::Http(HttpCalculationService::new(base_url)?))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// On-disk storage document.
    pub storage_path: PathBuf,
    pub service: ServiceConfig,
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Lifetime of status messages in milliseconds.
    pub status_ttl_ms: i64,
    /// Directory receiving exported reports.
    pub report_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(persistence::default_storage_path()),
            service: ServiceConfig::Local,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            status_ttl_ms: DEFAULT_STATUS_TTL_MS,
            report_dir: PathBuf::from("./reports"),
        }
    }
}

impl AppConfig {
    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] when `None`. An absent default
    /// file yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_yaml(&text).map_err(|reason| ConfigError::Invalid {
            path: path.display().to_string(),
            reason,
        })?;
        info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: AppConfig = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        if cfg.status_ttl_ms < 0 {
            return Err("status_ttl_ms must be >= 0".to_string());
        }
        Ok(cfg)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = AppConfig::from_yaml("debounce_ms: 250\n").unwrap();
        assert_eq!(cfg.debounce(), Duration::from_millis(250));
        assert_eq!(cfg.service, ServiceConfig::Local);
        assert_eq!(cfg.status_ttl_ms, 2500);
    }

    #[test]
    fn http_service_parses() {
        let cfg = AppConfig::from_yaml(
            "service:\n  kind: http\n  base_url: https://calc.example.test\n",
        )
        .unwrap();
        assert_eq!(
            cfg.service,
            ServiceConfig::Http {
                base_url: "https://calc.example.test".to_string()
            }
        );
        assert!(matches!(
            cfg.service.build().unwrap(),
            AnyCalculationService::Http(_)
        ));
    }

    #[test]
    fn negative_ttl_rejected() {
        assert!(AppConfig::from_yaml("status_ttl_ms: -1\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let missing = Path::new("/nonexistent/profitengine.yaml");
        assert!(matches!(
            AppConfig::load(Some(missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
