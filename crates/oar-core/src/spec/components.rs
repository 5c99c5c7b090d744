use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::parameter::ParameterOrRef;
use super::request_body::RequestBodyOrRef;
use super::response::{HeaderOrRef, ResponseOrRef};
use super::schema::SchemaOrRef;
use super::security::SecurityScheme;

/// Prefix of local references into `components.schemas`.
pub const COMPONENTS_SCHEMAS: &str = "#/components/schemas/";

/// Components object holding reusable definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(
        rename = "requestBodies",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, HeaderOrRef>,

    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// Extract the component name from a local `#/components/{section}/Name` ref.
pub fn component_ref_name<'a>(ref_path: &'a str, section: &str) -> Option<&'a str> {
    let stripped = ref_path.strip_prefix("#/components/")?;
    let (found, name) = stripped.split_once('/')?;
    (found == section && !name.is_empty() && !name.contains('/')).then_some(name)
}

/// Extract the component name from a local `#/components/schemas/Name` ref.
pub fn schema_ref_name(ref_path: &str) -> Option<&str> {
    component_ref_name(ref_path, "schemas")
}
