use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::components::{Components, schema_ref_name};
use super::operation::{HttpMethod, Operation, PathItem};
use super::schema::SchemaOrRef;
use super::security::{ApiKeyLocation, SecurityRequirement, SecurityScheme};
use super::server::Server;
use crate::error::SpecError;
use crate::path::PathTemplate;

/// OpenAPI version emitted for new documents.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,

    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Contact information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Tag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Top-level OpenAPI 3.0 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub openapi: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: None,
            tags: Vec::new(),
            security: None,
            extensions: IndexMap::new(),
        }
    }
}

impl Spec {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Info {
                title: title.into(),
                version: version.into(),
                ..Info::default()
            },
            ..Self::default()
        }
    }

    /// Components section, created on first access.
    pub fn components_ens(&mut self) -> &mut Components {
        self.components.get_or_insert_with(Components::default)
    }

    /// Schema registry, created on first access.
    pub fn schemas_ens(&mut self) -> &mut IndexMap<String, SchemaOrRef> {
        &mut self.components_ens().schemas
    }

    /// Security schemes registry, created on first access.
    pub fn security_schemes_ens(&mut self) -> &mut IndexMap<String, SecurityScheme> {
        &mut self.components_ens().security_schemes
    }

    /// Path item for `path`, created on first access.
    pub fn path_item_ens(&mut self, path: &str) -> &mut PathItem {
        self.paths.entry(path.to_string()).or_default()
    }

    /// Look up a named component schema.
    pub fn schema(&self, name: &str) -> Option<&SchemaOrRef> {
        self.components.as_ref()?.schemas.get(name)
    }

    /// Resolve a local `#/components/schemas/Name` reference.
    pub fn resolve_schema_ref(&self, ref_path: &str) -> Option<(&str, &SchemaOrRef)> {
        let name = schema_ref_name(ref_path)?;
        self.components
            .as_ref()?
            .schemas
            .get_key_value(name)
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Committed operation at (method, path). The path may still carry
    /// placeholder patterns.
    pub fn operation(&self, method: HttpMethod, path: &str) -> Option<&Operation> {
        let template = PathTemplate::parse(path);
        self.paths.get(&template.path)?.operation(method)
    }

    /// Validate an operation against its path template and commit it.
    ///
    /// The method is checked first, then path parameters, then uniqueness of
    /// (method, path). Nothing is written unless every check passes.
    pub fn add_operation(
        &mut self,
        method: &str,
        path: &str,
        operation: Operation,
    ) -> Result<(), SpecError> {
        let method: HttpMethod = method.parse()?;
        let template = PathTemplate::parse(path);
        template.validate(method, &operation.parameters)?;

        let exists = self
            .paths
            .get(&template.path)
            .is_some_and(|item| item.operation(method).is_some());
        if exists {
            return Err(SpecError::DuplicateOperation {
                method: method.to_string(),
                path: template.path,
            });
        }

        debug!("adding operation {} {}", method, template.path);
        *self.path_item_ens(&template.path).operation_slot_mut(method) = Some(operation);
        Ok(())
    }

    /// Register an HTTP Basic security scheme.
    pub fn set_http_basic_security(&mut self, name: &str, description: Option<&str>) {
        let mut scheme = SecurityScheme::http("basic");
        scheme.description = description.map(str::to_string);
        self.security_schemes_ens().insert(name.to_string(), scheme);
    }

    /// Register an HTTP Bearer security scheme with an optional token format.
    pub fn set_http_bearer_token_security(
        &mut self,
        name: &str,
        format: Option<&str>,
        description: Option<&str>,
    ) {
        let mut scheme = SecurityScheme::http("bearer");
        scheme.bearer_format = format.map(str::to_string);
        scheme.description = description.map(str::to_string);
        self.security_schemes_ens().insert(name.to_string(), scheme);
    }

    /// Register an API key security scheme read from `field_name` in `location`.
    pub fn set_api_key_security(
        &mut self,
        name: &str,
        field_name: &str,
        location: ApiKeyLocation,
        description: Option<&str>,
    ) {
        let mut scheme = SecurityScheme::api_key(field_name, location);
        scheme.description = description.map(str::to_string);
        self.security_schemes_ens().insert(name.to_string(), scheme);
    }
}
