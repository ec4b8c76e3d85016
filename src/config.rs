//! Gateway settings: JSON file with environment overrides.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GatewayError, Result};
use crate::liveness::DEFAULT_THRESHOLD_SECS;

pub const DEFAULT_CONFIG_FILE: &str = "cfg.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    /// Storage node name to `host:port` (or full base URL).
    pub backends: BTreeMap<String, String>,
    pub storage: StorageSettings,
    pub liveness: LivenessSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub listen: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9966".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub connect_timeout_ms: u64,
    pub call_timeout_ms: u64,
    /// Upper bound on in-flight storage calls per request.
    pub max_concurrency: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            call_timeout_ms: 5000,
            max_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessSettings {
    pub threshold_secs: i64,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            threshold_secs: DEFAULT_THRESHOLD_SECS,
        }
    }
}

impl Settings {
    /// Loads `path` when given, otherwise `cfg.json` if present, otherwise
    /// defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                warn!("No config file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_json(&raw)?;
        info!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))
    }

    /// `LISTEN_ADDR` replaces `http.listen`; `STORAGE_BACKENDS`
    /// (`name=addr,name=addr`) replaces the backend map.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(listen) = env::var("LISTEN_ADDR") {
            self.http.listen = listen;
        }
        if let Ok(raw) = env::var("STORAGE_BACKENDS") {
            self.backends = parse_backends(&raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.listen.is_empty() {
            return Err(GatewayError::Config("http.listen must not be empty".to_string()));
        }
        if self.storage.max_concurrency == 0 {
            return Err(GatewayError::Config(
                "storage.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.liveness.threshold_secs < 0 {
            return Err(GatewayError::Config(
                "liveness.threshold_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_backends(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut backends = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, addr) = entry.split_once('=').ok_or_else(|| {
            GatewayError::Config(format!("Invalid STORAGE_BACKENDS entry: {}", entry))
        })?;
        backends.insert(name.trim().to_string(), addr.trim().to_string());
    }
    Ok(backends)
}
