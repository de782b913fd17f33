//! Configuration management for addin-resolver
//!
//! Handles configuration loading, environment overrides, and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::image::DEFAULT_MAX_HEADER_LEN;
use crate::module::traits::ResolverError;
use crate::utils::env::env_opt;

/// Environment variable overriding `module_extension`
pub const ENV_EXTENSION: &str = "ADDIN_RESOLVER_EXTENSION";
/// Environment variable overriding `log_filter`
pub const ENV_LOG: &str = "ADDIN_RESOLVER_LOG";

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Extension of loadable module files, without the dot
    #[serde(default = "default_module_extension")]
    pub module_extension: String,

    /// Largest encoded module header accepted when reading images
    #[serde(default = "default_max_header_len")]
    pub max_header_len: u32,

    /// Log filter (e.g. "info", "addin_resolver=debug")
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_module_extension() -> String {
    "dll".to_string()
}

fn default_max_header_len() -> u32 {
    DEFAULT_MAX_HEADER_LEN
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            module_extension: default_module_extension(),
            max_header_len: default_max_header_len(),
            log_filter: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ResolverConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ResolverConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<(), ResolverError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `ADDIN_RESOLVER_*` environment overrides
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(ext) = env_opt(ENV_EXTENSION) {
            self.module_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(filter) = env_opt(ENV_LOG) {
            self.log_filter = Some(filter);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ResolverError> {
        let ext = &self.module_extension;
        if ext.is_empty() {
            return Err(ResolverError::Config(
                "module_extension cannot be empty".to_string(),
            ));
        }
        if ext.contains(['.', '/', '\\']) {
            return Err(ResolverError::Config(format!(
                "module_extension {:?} must be a bare extension without dots or separators",
                ext
            )));
        }
        if self.max_header_len == 0 {
            return Err(ResolverError::Config(
                "max_header_len must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
