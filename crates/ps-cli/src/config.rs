//! CLI configuration.
//!
//! Settings come from an optional TOML file:
//!
//! ```toml
//! store_path = "/home/me/proofs.json"
//! default_category = "apartment"
//! ```
//!
//! The file is taken from `--config`, then `$PROOFSTAMP_CONFIG`. The store
//! path is resolved as `--store`, then `$PROOFSTAMP_STORE`, then the file,
//! then [`DEFAULT_STORE_PATH`].

use anyhow::{Context, Result};
use ps_proof::Category;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "PROOFSTAMP_CONFIG";
pub const STORE_ENV: &str = "PROOFSTAMP_STORE";
pub const DEFAULT_STORE_PATH: &str = ".proofstamp/proofs.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    #[serde(deserialize_with = "strict_category")]
    pub default_category: Option<Category>,
}

/// Unlike stored records, a config file must name a known category.
fn strict_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|name| name.parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl Config {
    /// Load from an explicit path, `$PROOFSTAMP_CONFIG`, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Store path with `--store` and `$PROOFSTAMP_STORE` taking precedence.
    pub fn store_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        resolve_store_path(cli_override, env::var_os(STORE_ENV).map(PathBuf::from), self)
    }

    pub fn category_or_default(&self, requested: Option<Category>) -> Category {
        requested.or(self.default_category).unwrap_or_default()
    }
}

fn resolve_store_path(
    cli_override: Option<PathBuf>,
    from_env: Option<PathBuf>,
    config: &Config,
) -> PathBuf {
    cli_override
        .or(from_env)
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
}
