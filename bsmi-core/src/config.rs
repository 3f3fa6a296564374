//! Tool configuration
//!
//! Settings are read from a YAML file. Lookup order: an explicit path, then
//! `$BSMI_CONFIG`, then `<config dir>/bsmi/config.yaml`. Without a file the
//! defaults apply. Command line options override whatever is loaded here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{ALLOCATION_PARAMETER, UNALLOCATED_SENTINEL};
use crate::report::ReportSettings;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "BSMI_CONFIG";

/// Code given to requirements that are not allocated
pub const DEFAULT_UNALLOCATED_CODE: &str = "9999";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Parameter short name that carries the allocation code
    pub allocation_parameter: String,
    pub unallocated_code: String,
    /// Direct value meaning "not allocated"
    pub unallocated_sentinel: String,
    pub include_empty_containers: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            allocation_parameter: ALLOCATION_PARAMETER.to_string(),
            unallocated_code: DEFAULT_UNALLOCATED_CODE.to_string(),
            unallocated_sentinel: UNALLOCATED_SENTINEL.to_string(),
            include_empty_containers: false,
            data_source: None,
            model: None,
            iteration: None,
            domain: None,
            username: None,
        }
    }
}

impl ToolConfig {
    /// Loads the configuration from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = serde_yaml::from_str(&content)?;
        log::debug!("loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Loads from `explicit`, `$BSMI_CONFIG` or the default location, falling
    /// back to defaults when no file exists at the default location
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Save the configuration to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;

        Ok(())
    }

    /// Copy of this configuration that remembers the given session values
    pub fn with_session(
        &self,
        data_source: &str,
        username: &str,
        model: &str,
        iteration: u32,
        domain: &str,
    ) -> Self {
        Self {
            data_source: Some(data_source.to_string()),
            username: Some(username.to_string()),
            model: Some(model.to_string()),
            iteration: Some(iteration),
            domain: Some(domain.to_string()),
            ..self.clone()
        }
    }

    /// Settings handed to the report generators
    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            allocation_parameter: self.allocation_parameter.clone(),
            unallocated_code: self.unallocated_code.clone(),
            unallocated_sentinel: self.unallocated_sentinel.clone(),
            include_empty_containers: self.include_empty_containers,
        }
    }
}

/// Where the configuration is saved: `explicit`, then `$BSMI_CONFIG`, then
/// the default location
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(default_config_path)
}

/// `<config dir>/bsmi/config.yaml`, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bsmi").join("config.yaml"))
}
