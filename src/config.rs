//! Configuration loader and validator for the restoration admin.
//!
//! Settings come from an optional YAML file, then the environment (a `.env`
//! file is honoured). The gateway URL and public key are required.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_GATEWAY_URL: &str = "SUPABASE_URL";
pub const ENV_GATEWAY_KEY: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub gateway: Gateway,
    #[serde(default)]
    pub downloads: Downloads,
}

/// Hosted backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gateway {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for Gateway {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: default_table(),
        }
    }
}

/// Where downloaded images land.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Downloads {
    #[serde(default = "default_downloads_dir")]
    pub dir: String,
}

impl Default for Downloads {
    fn default() -> Self {
        Self {
            dir: default_downloads_dir(),
        }
    }
}

fn default_table() -> String {
    "customers".to_string()
}

fn default_downloads_dir() -> String {
    "./downloads".to_string()
}

impl Config {
    /// Parsed gateway base URL. Only valid after `validate` succeeded.
    pub fn gateway_url(&self) -> Result<Url, ConfigError> {
        parse_gateway_url(&self.gateway.url)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        PathBuf::from(&self.downloads.dir)
    }

    /// Overlay environment settings using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GATEWAY_URL).filter(|v| !v.trim().is_empty()) {
            self.gateway.url = url.trim().to_string();
        }
        if let Some(key) = lookup(ENV_GATEWAY_KEY).filter(|v| !v.trim().is_empty()) {
            self.gateway.anon_key = key.trim().to_string();
        }
    }
}

/// Load configuration and validate it.
/// - `path` defaults to `config.yaml`; a missing file is not an error.
/// - `.env` and process environment override the file.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load`] with an explicit environment lookup and no `.env` handling.
pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let mut cfg = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)?
    } else {
        Config::default()
    };
    cfg.apply_env_with(lookup);
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    if cfg.gateway.url.trim().is_empty() {
        missing.push(ENV_GATEWAY_URL);
    }
    if cfg.gateway.anon_key.trim().is_empty() {
        missing.push(ENV_GATEWAY_KEY);
    }
    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    parse_gateway_url(&cfg.gateway.url)?;

    if cfg.gateway.table.trim().is_empty() {
        return Err(ConfigError::Invalid("gateway.table must be non-empty"));
    }
    if cfg.downloads.dir.trim().is_empty() {
        return Err(ConfigError::Invalid("downloads.dir must be non-empty"));
    }

    Ok(())
}

fn parse_gateway_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| ConfigError::Invalid("gateway.url must be an absolute URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid("gateway.url must use http or https"));
    }
    Ok(url)
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"gateway:
  url: "https://YOUR-PROJECT.supabase.co"
  anon_key: "YOUR_SUPABASE_ANON_KEY"
  table: "customers"

downloads:
  dir: "./downloads"
"#
}
