//! Settings structures for seekify configuration

use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Proxy address used for the `tb` alias (Tor Browser)
pub const TOR_BROWSER_PROXY: &str = "socks5h://127.0.0.1:9150";

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Outbound proxy address (`tb` is an alias for the Tor Browser proxy)
    pub proxy: Option<String>,
    /// Request timeout in seconds, also used as the per-call deadline
    pub timeout: u64,
    /// TLS verification policy
    pub verify: TlsVerify,
    /// Worker budget shared by all calls of a session (None = auto)
    pub threads: Option<usize>,
    /// Defaults applied to requests built by the CLI
    pub defaults: SearchDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: crate::DEFAULT_TIMEOUT,
            verify: TlsVerify::default(),
            threads: None,
            defaults: SearchDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the first settings file found, then merge the environment
    pub fn load() -> anyhow::Result<Self> {
        let mut settings = match Self::locate() {
            Some(path) => {
                tracing::debug!("Loading settings from: {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        settings.merge_env();
        Ok(settings)
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SEEKIFY_SETTINGS_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let mut candidates = vec![PathBuf::from("seekify.yml")];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("seekify/settings.yml"));
        }
        candidates.into_iter().find(|p| p.exists())
    }

    /// Merge with environment variables (SEEKIFY_* prefix)
    pub fn merge_env(&mut self) {
        if self.proxy.is_none() {
            if let Ok(val) = std::env::var("SEEKIFY_PROXY") {
                if !val.is_empty() {
                    self.proxy = Some(val);
                }
            }
        }
        if let Ok(val) = std::env::var("SEEKIFY_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.timeout = timeout;
            }
        }
        if let Ok(val) = std::env::var("SEEKIFY_VERIFY") {
            self.verify = TlsVerify::parse(&val);
        }
        if let Ok(val) = std::env::var("SEEKIFY_THREADS") {
            if let Ok(threads) = val.parse() {
                self.threads = Some(threads);
            }
        }
    }

    /// Effective worker budget for the shared pool
    pub fn worker_budget(&self) -> usize {
        self.threads.filter(|&t| t > 0).unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cpus + 4).min(32)
        })
    }

    /// Configuration handed to every backend constructor
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            proxy: self.proxy.as_deref().map(expand_proxy_alias),
            timeout: Duration::from_secs(self.timeout),
            verify: self.verify.clone(),
        }
    }
}

/// Expand proxy shorthands
pub fn expand_proxy_alias(proxy: &str) -> String {
    if proxy == "tb" {
        TOR_BROWSER_PROXY.to_string()
    } else {
        proxy.to_string()
    }
}

/// TLS verification policy: a flag or a path to a PEM trust bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TlsVerify {
    Enabled(bool),
    Bundle(PathBuf),
}

impl Default for TlsVerify {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl TlsVerify {
    /// Parse `true`/`false` or treat anything else as a bundle path
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Self::Enabled(true),
            "false" | "0" | "no" => Self::Enabled(false),
            _ => Self::Bundle(PathBuf::from(value.trim())),
        }
    }
}

/// Defaults for request fields not given on the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub region: String,
    pub safesearch: String,
    pub max_results: Option<usize>,
    pub backend: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            region: "us-en".to_string(),
            safesearch: "moderate".to_string(),
            max_results: Some(10),
            backend: "auto".to_string(),
        }
    }
}

/// Session-wide configuration passed to each backend on construction
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub verify: TlsVerify,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Settings::default().backend_config()
    }
}

impl BackendConfig {
    /// Read the trust bundle if one was configured
    pub fn load_bundle(&self) -> Result<Option<Vec<u8>>, BackendError> {
        match &self.verify {
            TlsVerify::Bundle(path) => std::fs::read(path)
                .map(Some)
                .map_err(|e| BackendError::Build(format!("{}: {}", path.display(), e))),
            TlsVerify::Enabled(_) => Ok(None),
        }
    }
}
