pub mod components;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod security;
pub mod server;
#[allow(clippy::module_inception)]
pub mod spec;

use crate::error::FormatError;
use spec::Spec;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<Spec, FormatError> {
    let spec: Spec = serde_yaml_ng::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<Spec, FormatError> {
    let spec: Spec = serde_json::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Render a document as YAML.
pub fn to_yaml(spec: &Spec) -> Result<String, FormatError> {
    Ok(serde_yaml_ng::to_string(spec)?)
}

/// Render a document as pretty-printed JSON.
pub fn to_json(spec: &Spec) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(spec)?)
}

fn validate_version(spec: &Spec) -> Result<(), FormatError> {
    if !spec.openapi.starts_with("3.") {
        return Err(FormatError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}
