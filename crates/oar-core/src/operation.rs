//! Caller-facing description of an operation and its content units.

use std::collections::HashMap;
use std::fmt;

use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use oar_schema::Model;

use crate::spec::media_type::MediaType;
use crate::spec::parameter::ParameterLocation;
use crate::spec::security::SecurityRequirement;

/// Where a field of a model is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum In {
    Query,
    Path,
    Header,
    Cookie,
    FormData,
    Body,
}

impl In {
    /// Field tag selecting this location.
    pub fn tag(&self) -> &'static str {
        match self {
            In::Query => "query",
            In::Path => "path",
            In::Header => "header",
            In::Cookie => "cookie",
            In::FormData => "formData",
            In::Body => "json",
        }
    }

    /// Parameter location, for the four parameter-bearing locations.
    pub fn parameter_location(&self) -> Option<ParameterLocation> {
        match self {
            In::Query => Some(ParameterLocation::Query),
            In::Path => Some(ParameterLocation::Path),
            In::Header => Some(ParameterLocation::Header),
            In::Cookie => Some(ParameterLocation::Cookie),
            In::FormData | In::Body => None,
        }
    }

    /// Prefix for definitions reflected for this location, e.g. `Query`.
    pub fn definition_prefix(&self) -> String {
        self.tag().to_upper_camel_case()
    }
}

impl fmt::Display for In {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Hook adjusting the generated media type of a content unit.
pub type Customize = Box<dyn Fn(&mut MediaType)>;

/// One request or response payload declaration.
#[derive(Default)]
pub struct ContentUnit {
    pub model: Option<Box<dyn Model>>,
    /// Explicit content type; empty means "derive from the model".
    pub content_type: String,
    /// Response status; `None` defaults to 200.
    pub http_status: Option<u16>,
    /// Response used for any status not otherwise declared.
    pub is_default: bool,
    /// Status names a class, e.g. 2 for `2XX`.
    pub is_range: bool,
    pub description: String,
    /// Field name to parameter/property name overrides, per location.
    pub field_mapping: HashMap<In, IndexMap<String, String>>,
    pub customize: Option<Customize>,
}

impl ContentUnit {
    pub fn new(model: impl Model + 'static) -> Self {
        Self {
            model: Some(Box::new(model)),
            ..Self::default()
        }
    }

    /// A unit without a model, e.g. an empty 204 response.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn default_response(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Declare a status class, e.g. `range(2)` for `2XX`.
    pub fn range(mut self, class: u16) -> Self {
        self.http_status = Some(class);
        self.is_range = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn map_field(
        mut self,
        location: In,
        field: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.field_mapping
            .entry(location)
            .or_default()
            .insert(field.into(), name.into());
        self
    }

    pub fn customize<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut MediaType) + 'static,
    {
        self.customize = Some(Box::new(f));
        self
    }

    pub(crate) fn mapping(&self, location: In) -> IndexMap<String, String> {
        self.field_mapping.get(&location).cloned().unwrap_or_default()
    }

    /// Key of this unit in an operation's responses.
    pub fn status_key(&self) -> String {
        if self.is_default {
            return "default".to_string();
        }
        match self.http_status {
            Some(status) if self.is_range => format!("{}XX", status),
            Some(status) => status.to_string(),
            None => "200".to_string(),
        }
    }
}

impl fmt::Debug for ContentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentUnit")
            .field("model", &self.model.as_ref().map(|m| m.shape()))
            .field("content_type", &self.content_type)
            .field("http_status", &self.http_status)
            .field("is_default", &self.is_default)
            .field("is_range", &self.is_range)
            .field("description", &self.description)
            .field("field_mapping", &self.field_mapping)
            .field("customize", &self.customize.is_some())
            .finish()
    }
}

/// Everything needed to add one operation to a document.
#[derive(Debug)]
pub struct OperationContext {
    pub method: String,
    pub path: String,
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub security: Vec<SecurityRequirement>,
    pub request: Vec<ContentUnit>,
    pub response: Vec<ContentUnit>,
}

impl OperationContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            security: Vec::new(),
            request: Vec::new(),
            response: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Require the named security scheme with the given scopes.
    pub fn security(mut self, scheme: impl Into<String>, scopes: &[&str]) -> Self {
        let mut requirement = SecurityRequirement::new();
        requirement.insert(scheme.into(), scopes.iter().map(|s| s.to_string()).collect());
        self.security.push(requirement);
        self
    }

    pub fn add_req_structure(mut self, unit: ContentUnit) -> Self {
        self.request.push(unit);
        self
    }

    pub fn add_resp_structure(mut self, unit: ContentUnit) -> Self {
        self.response.push(unit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oar_schema::Shape;

    #[test]
    fn status_keys() {
        assert_eq!(ContentUnit::empty().status_key(), "200");
        assert_eq!(ContentUnit::empty().status(204).status_key(), "204");
        assert_eq!(ContentUnit::empty().range(4).status_key(), "4XX");
        assert_eq!(
            ContentUnit::empty().status(500).default_response().status_key(),
            "default"
        );
    }

    #[test]
    fn definition_prefixes() {
        assert_eq!(In::Query.definition_prefix(), "Query");
        assert_eq!(In::FormData.definition_prefix(), "FormData");
    }

    #[test]
    fn field_mapping_per_location() {
        let unit = ContentUnit::new(Shape::string()).map_field(In::Query, "Bar", "baz");
        assert_eq!(unit.mapping(In::Query).get("Bar").map(String::as_str), Some("baz"));
        assert!(unit.mapping(In::Header).is_empty());
    }
}
