use oar_schema::ReflectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to process YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("unexpected http method: {0}")]
    UnsupportedMethod(String),

    /// Every path/parameter mismatch of one operation, in detection order.
    #[error("validate path params {method} {path}: {}", .issues.join(", "))]
    PathParams {
        method: String,
        path: String,
        issues: Vec<String>,
    },

    #[error("operation already exists: {method} {path}")]
    DuplicateOperation { method: String, path: String },

    #[error("operation not found: {method} {path}")]
    OperationNotFound { method: String, path: String },
}

#[derive(Debug, Error)]
pub enum ReflectorError {
    #[error("invalid operation: {0}")]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Reflect(#[from] ReflectError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml_ng::Error,
    },
}
