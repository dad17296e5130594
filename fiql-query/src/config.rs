//! Configuration file parsing for `fiql.toml`.
//!
//! ```toml
//! [adapter]
//! dialect = "postgres"
//! table_name = "orders"
//!
//! [environments.test.adapter]
//! dialect = "sqlite"
//! ```
//!
//! Values may reference environment variables as `${NAME}`; unset variables
//! are left as written.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{FiqlError, FiqlResult};

/// Main configuration structure for `fiql.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FiqlConfig {
    /// Adapter settings.
    #[serde(default)]
    pub adapter: AdapterConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl FiqlConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> FiqlResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FiqlError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> FiqlResult<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = toml::from_str(&expanded).map_err(|e| FiqlError::Toml { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot produce valid SQL.
    pub fn validate(&self) -> FiqlResult<()> {
        validate_table_name("adapter", self.adapter.table_name.as_deref())?;
        for (env, overrides) in &self.environments {
            let table = overrides.adapter.as_ref().and_then(|a| a.table_name.as_deref());
            validate_table_name(&format!("environments.{env}.adapter"), table)?;
        }
        Ok(())
    }

    /// Apply the overrides of environment `env`, if any.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(adapter) = self.environments.remove(env).and_then(|o| o.adapter) {
            if let Some(dialect) = adapter.dialect {
                self.adapter.dialect = dialect;
            }
            if let Some(table_name) = adapter.table_name {
                self.adapter.table_name = Some(table_name);
            }
        }
        self
    }
}

/// Settings for building an [`Adapter`](crate::Adapter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Target SQL dialect.
    #[serde(default)]
    pub dialect: Dialect,

    /// Default qualifier for columns without one.
    pub table_name: Option<String>,
}

/// Overrides applied by [`FiqlConfig::with_environment`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Adapter overrides.
    pub adapter: Option<AdapterOverride>,
}

/// Adapter fields that an environment may override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterOverride {
    pub dialect: Option<Dialect>,
    pub table_name: Option<String>,
}

fn validate_table_name(section: &str, table: Option<&str>) -> FiqlResult<()> {
    match table {
        Some(table) if table.split('.').any(|segment| segment.trim().is_empty()) => {
            Err(FiqlError::Config {
                message: format!("[{section}] table_name `{table}` has an empty segment"),
            })
        }
        _ => Ok(()),
    }
}

fn expand_env_vars(content: &str) -> FiqlResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}").map_err(|e| FiqlError::Config {
        message: e.to_string(),
    })?;

    let expanded = re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(expanded.into_owned())
}
