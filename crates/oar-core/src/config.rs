use std::fs;
use std::path::Path;

use oar_schema::DEFAULT_DEFINITIONS_PREFIX;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::spec::server::Server;
use crate::spec::spec::{DEFAULT_OPENAPI_VERSION, Info, Spec};

/// Settings threaded through document assembly, loaded from `.oar.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    /// OpenAPI version written into new documents.
    pub openapi: String,
    pub info: InfoConfig,
    pub servers: Vec<Server>,
    /// Prefix of `$ref` values pointing at component schemas.
    pub definitions_prefix: String,
    /// Media type used for JSON bodies.
    pub json_content_type: String,
    /// Name prefix of form body definitions.
    pub form_definition_prefix: String,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: InfoConfig::default(),
            servers: Vec::new(),
            definitions_prefix: DEFAULT_DEFINITIONS_PREFIX.to_string(),
            json_content_type: "application/json".to_string(),
            form_definition_prefix: "FormData".to_string(),
        }
    }
}

impl ReflectorConfig {
    /// An empty document carrying the configured version, info and servers.
    pub fn new_spec(&self) -> Spec {
        Spec {
            openapi: self.openapi.clone(),
            info: (&self.info).into(),
            servers: self.servers.clone(),
            ..Spec::default()
        }
    }
}

/// Document info defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "0.0.0".to_string(),
            description: None,
        }
    }
}

impl From<&InfoConfig> for Info {
    fn from(value: &InfoConfig) -> Self {
        Info {
            title: value.title.clone(),
            version: value.version.clone(),
            description: value.description.clone(),
            ..Info::default()
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oar.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ReflectorConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: ReflectorConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}
