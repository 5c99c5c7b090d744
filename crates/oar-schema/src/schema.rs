use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A JSON Schema simple type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// The `type` keyword can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SimpleType),
    Multiple(Vec<SimpleType>),
}

impl TypeSet {
    /// All types in declaration order.
    pub fn types(&self) -> Vec<SimpleType> {
        match self {
            TypeSet::Single(t) => vec![*t],
            TypeSet::Multiple(ts) => ts.clone(),
        }
    }

    pub fn contains(&self, t: SimpleType) -> bool {
        match self {
            TypeSet::Single(s) => *s == t,
            TypeSet::Multiple(ts) => ts.contains(&t),
        }
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrBool {
    Bool(bool),
    Schema(Box<JsonSchema>),
}

/// Vendor extension marking a `$ref` use site as deprecated.
///
/// A reference node cannot carry the `deprecated` keyword itself, so the
/// flag travels as an extension next to `$ref`.
pub const X_DEPRECATED: &str = "x-deprecated";

/// A format-neutral JSON Schema node (draft-04 flavoured bounds).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    // Numeric constraints
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,

    // String constraints
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    // Object
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<SchemaOrBool>,
    #[serde(rename = "minProperties", skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(rename = "maxProperties", skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    // Composition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<JsonSchema>>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<JsonSchema>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<JsonSchema>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonSchema>,

    // Annotations
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Named sub-definitions collected while reflecting.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, JsonSchema>,

    /// Vendor extensions and any keyword this model does not know.
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl JsonSchema {
    /// A bare reference node.
    pub fn reference(path: impl Into<String>) -> Self {
        Self {
            reference: Some(path.into()),
            ..Self::default()
        }
    }

    /// A schema with a single type.
    pub fn typed(t: SimpleType) -> Self {
        Self {
            schema_type: Some(TypeSet::Single(t)),
            ..Self::default()
        }
    }

    /// A schema that matches nothing (`{"not": {}}`).
    pub fn never() -> Self {
        Self {
            not: Some(Box::new(Self::default())),
            ..Self::default()
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn has_type(&self, t: SimpleType) -> bool {
        self.schema_type.as_ref().is_some_and(|ts| ts.contains(t))
    }

    /// Add a type keyword value, widening a single type into an array.
    pub fn add_type(&mut self, t: SimpleType) {
        self.schema_type = match self.schema_type.take() {
            None => Some(TypeSet::Single(t)),
            Some(TypeSet::Single(existing)) if existing == t => Some(TypeSet::Single(existing)),
            Some(TypeSet::Single(existing)) => Some(TypeSet::Multiple(vec![existing, t])),
            Some(TypeSet::Multiple(mut ts)) => {
                if !ts.contains(&t) {
                    ts.push(t);
                }
                Some(TypeSet::Multiple(ts))
            }
        };
    }

    /// Whether the `x-deprecated` extension is set on this node.
    pub fn is_deprecated_site(&self) -> bool {
        self.extensions
            .get(X_DEPRECATED)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Visit every direct sub-schema, including definitions.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&JsonSchema)) {
        if let Some(items) = &self.items {
            f(items);
        }
        for prop in self.properties.values() {
            f(prop);
        }
        if let Some(SchemaOrBool::Schema(s)) = &self.additional_properties {
            f(s);
        }
        if let Some(not) = &self.not {
            f(not);
        }
        for s in self.all_of.iter().chain(&self.one_of).chain(&self.any_of) {
            f(s);
        }
        for def in self.definitions.values() {
            f(def);
        }
    }

    /// Mutable counterpart of [`JsonSchema::for_each_child`].
    pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut JsonSchema)) {
        if let Some(items) = &mut self.items {
            f(items);
        }
        for prop in self.properties.values_mut() {
            f(prop);
        }
        if let Some(SchemaOrBool::Schema(s)) = &mut self.additional_properties {
            f(s);
        }
        if let Some(not) = &mut self.not {
            f(not);
        }
        for s in self
            .all_of
            .iter_mut()
            .chain(self.one_of.iter_mut())
            .chain(self.any_of.iter_mut())
        {
            f(s);
        }
        for def in self.definitions.values_mut() {
            f(def);
        }
    }
}
