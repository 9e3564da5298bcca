//! `~/.trawl/config.toml` loading.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use trawl_tools::SearchToolConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct TrawlConfig {
    pub search: Option<SearchConfig>,
    pub workspace: Option<WorkspaceConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchConfig {
    /// Matcher binary name on `PATH` or an explicit path.
    pub binary: Option<String>,
    pub total_cap: Option<usize>,
    pub threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directories; `${VAR}` references are expanded.
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default)]
    pub allow_outside_roots: bool,
}

impl TrawlConfig {
    /// Load the default config file. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn search_tool_config(&self) -> SearchToolConfig {
        let search = self.search.as_ref();
        SearchToolConfig::default().with_overrides(
            search.and_then(|s| s.binary.clone()),
            search.and_then(|s| s.total_cap),
            search.and_then(|s| s.threads),
        )
    }

    /// Configured roots with environment variables expanded; blank entries are dropped.
    #[must_use]
    pub fn roots(&self) -> Vec<PathBuf> {
        self.workspace
            .as_ref()
            .map(|w| {
                w.roots
                    .iter()
                    .map(|root| expand_env_vars(root))
                    .filter(|root| !root.trim().is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn allow_outside_roots(&self) -> bool {
        self.workspace
            .as_ref()
            .is_some_and(|w| w.allow_outside_roots)
    }
}

/// Replace `${VAR}` with the variable's value (empty when unset). An unclosed `${` is kept.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + end_rel];
        if !name.is_empty() {
            out.push_str(&env::var(name).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".trawl").join("config.toml"))
}
