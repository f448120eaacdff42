use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PayreportConfig {
    #[serde(default)]
    pub sentry: SentryConfig,

    #[serde(default)]
    pub gravity_forms: GravityFormsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Sentry event-search API settings. The bearer token never lives in the
/// config file; it comes from the `SENTRY_TOKEN` environment variable.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SentryConfig {
    #[serde(default = "default_sentry_base_url")]
    pub base_url: String,

    pub organization: Option<String>,

    /// Tag keys projected from upstream events into cached records.
    #[serde(default = "default_tag_keys")]
    pub tag_keys: Vec<String>,

    /// Issues to report on.
    #[serde(default)]
    pub issues: Vec<IssueConfig>,

    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct IssueConfig {
    pub id: String,
    pub name: String,
}

/// Gravity Forms API settings. Consumer key/secret come from the
/// `GF_CONSUMER_KEY` / `GF_CONSUMER_SECRET` environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GravityFormsConfig {
    pub base_url: Option<String>,

    #[serde(default)]
    pub forms: Vec<FormConfig>,

    #[serde(skip)]
    pub consumer_key: Option<String>,

    #[serde(skip)]
    pub consumer_secret: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FormConfig {
    pub id: u64,
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_sentry_base_url() -> String {
    "https://sentry.io".to_string()
}

fn default_tag_keys() -> Vec<String> {
    vec!["reason".to_string(), "merchant".to_string()]
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(".payreport/cache")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./reports")
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            base_url: default_sentry_base_url(),
            organization: None,
            tag_keys: default_tag_keys(),
            issues: Vec::new(),
            token: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    #[error("missing config field: {0}")]
    MissingField(&'static str),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PayreportConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PayreportConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with precedence: defaults, then the config file (explicit
    /// `--config` path, else `./payreport.toml` when present), then
    /// environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load_from_file(path)
                .map_err(|e| anyhow!("failed to load config file {}: {}", path.display(), e))?,
            None => {
                let default_path = Path::new("./payreport.toml");
                if default_path.exists() {
                    Self::load_from_file(default_path)
                        .map_err(|e| anyhow!("failed to load {}: {}", default_path.display(), e))?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_vars(&std::env::vars().collect());
        Ok(config)
    }

    /// Apply environment overrides: secrets plus `PAYREPORT_*` scalars.
    pub fn apply_env_vars(&mut self, env_vars: &HashMap<String, String>) {
        if let Some(token) = env_vars.get("SENTRY_TOKEN") {
            self.sentry.token = Some(token.clone());
        }
        if let Some(key) = env_vars.get("GF_CONSUMER_KEY") {
            self.gravity_forms.consumer_key = Some(key.clone());
        }
        if let Some(secret) = env_vars.get("GF_CONSUMER_SECRET") {
            self.gravity_forms.consumer_secret = Some(secret.clone());
        }

        for (key, value) in env_vars {
            let Some(config_key) = key.strip_prefix("PAYREPORT_") else {
                continue;
            };
            match config_key {
                "SENTRY_BASE_URL" => self.sentry.base_url = value.clone(),
                "SENTRY_ORGANIZATION" => self.sentry.organization = Some(value.clone()),
                "GF_BASE_URL" => self.gravity_forms.base_url = Some(value.clone()),
                "CACHE_DIRECTORY" => self.cache.directory = PathBuf::from(value),
                "REPORT_OUTPUT_DIR" => self.report.output_dir = PathBuf::from(value),
                _ => {} // Ignore unknown environment variables
            }
        }
    }

    /// Fail fast before any work when an enabled stage lacks what it needs.
    pub fn validate(&self, skip_sentry: bool, skip_gravity_forms: bool) -> Result<(), ConfigError> {
        if !skip_sentry && !self.sentry.issues.is_empty() {
            if self.sentry.token.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingCredential("SENTRY_TOKEN"));
            }
            if self.sentry.organization.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingField("sentry.organization"));
            }
        }

        if !skip_gravity_forms && !self.gravity_forms.forms.is_empty() {
            if self
                .gravity_forms
                .base_url
                .as_deref()
                .map_or(true, str::is_empty)
            {
                return Err(ConfigError::MissingField("gravity_forms.base_url"));
            }
            if self
                .gravity_forms
                .consumer_key
                .as_deref()
                .map_or(true, str::is_empty)
            {
                return Err(ConfigError::MissingCredential("GF_CONSUMER_KEY"));
            }
            if self
                .gravity_forms
                .consumer_secret
                .as_deref()
                .map_or(true, str::is_empty)
            {
                return Err(ConfigError::MissingCredential("GF_CONSUMER_SECRET"));
            }
        }

        Ok(())
    }
}
