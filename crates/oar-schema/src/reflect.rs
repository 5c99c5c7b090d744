use std::fmt;

use indexmap::IndexMap;
use log::trace;

use crate::error::ReflectError;
use crate::schema::{JsonSchema, SchemaOrBool, SimpleType, X_DEPRECATED};
use crate::shape::{Field, Shape, StructShape};

/// Where named definitions are referenced from unless configured otherwise.
pub const DEFAULT_DEFINITIONS_PREFIX: &str = "#/components/schemas/";

/// A property the reflector is about to emit, handed to the intercept hook.
#[derive(Debug)]
pub struct PropertyContext<'a> {
    pub name: &'a str,
    pub field: &'a Field,
    /// Nesting level of the owning struct; 0 is the reflected model itself.
    pub depth: usize,
}

/// Hook invoked once per emitted property; it may rewrite the schema.
pub type InterceptProp<'a> =
    Box<dyn FnMut(&PropertyContext<'_>, &mut JsonSchema) -> Result<(), ReflectError> + 'a>;

/// Options for a single reflection pass.
pub struct ReflectOptions<'a> {
    /// Prefix of `$ref` values pointing at collected definitions.
    pub definitions_prefix: String,
    /// Prepended to struct names when naming definitions.
    pub definition_name_prefix: String,
    /// Tag naming properties; fields without it (or a fallback) are skipped.
    pub property_name_tag: String,
    /// Fallback tags consulted in order when the main tag is absent.
    pub additional_tags: Vec<String>,
    /// Emit the root struct as a definition and return a reference to it.
    pub root_ref: bool,
    /// Explicit field name to property name overrides for the root struct.
    pub property_name_mapping: IndexMap<String, String>,
    pub intercept_prop: Option<InterceptProp<'a>>,
}

impl Default for ReflectOptions<'_> {
    fn default() -> Self {
        Self {
            definitions_prefix: DEFAULT_DEFINITIONS_PREFIX.to_string(),
            definition_name_prefix: String::new(),
            property_name_tag: "json".to_string(),
            additional_tags: Vec::new(),
            root_ref: false,
            property_name_mapping: IndexMap::new(),
            intercept_prop: None,
        }
    }
}

impl<'a> ReflectOptions<'a> {
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            property_name_tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn additional_tags(mut self, tags: &[&str]) -> Self {
        self.additional_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn definitions_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.definitions_prefix = prefix.into();
        self
    }

    pub fn definition_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.definition_name_prefix = prefix.into();
        self
    }

    pub fn root_ref(mut self, root_ref: bool) -> Self {
        self.root_ref = root_ref;
        self
    }

    pub fn property_name_mapping(mut self, mapping: IndexMap<String, String>) -> Self {
        self.property_name_mapping = mapping;
        self
    }

    pub fn intercept_prop<F>(mut self, f: F) -> Self
    where
        F: FnMut(&PropertyContext<'_>, &mut JsonSchema) -> Result<(), ReflectError> + 'a,
    {
        self.intercept_prop = Some(Box::new(f));
        self
    }

    fn name_tags(&self) -> Vec<String> {
        std::iter::once(self.property_name_tag.clone())
            .chain(self.additional_tags.iter().cloned())
            .collect()
    }
}

impl fmt::Debug for ReflectOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectOptions")
            .field("definitions_prefix", &self.definitions_prefix)
            .field("definition_name_prefix", &self.definition_name_prefix)
            .field("property_name_tag", &self.property_name_tag)
            .field("additional_tags", &self.additional_tags)
            .field("root_ref", &self.root_ref)
            .field("property_name_mapping", &self.property_name_mapping)
            .field("intercept_prop", &self.intercept_prop.is_some())
            .finish()
    }
}

/// Produces a generic schema tree, with named definitions, from a model shape.
pub trait Reflector {
    fn reflect(&self, shape: &Shape, options: ReflectOptions<'_>)
    -> Result<JsonSchema, ReflectError>;
}

/// Default reflector walking [`Shape`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeReflector;

impl Reflector for ShapeReflector {
    fn reflect(
        &self,
        shape: &Shape,
        options: ReflectOptions<'_>,
    ) -> Result<JsonSchema, ReflectError> {
        let mut walker = Walker {
            options,
            definitions: IndexMap::new(),
        };

        let mut root = match shape.deref_nullable() {
            Shape::Struct(s) if !walker.options.root_ref => {
                let mut root = walker.struct_schema(s, 0)?;
                if matches!(shape, Shape::Nullable(_)) {
                    root.add_type(SimpleType::Null);
                }
                root
            }
            _ => walker.schema_for(shape, 0)?,
        };
        root.definitions = walker.definitions;
        Ok(root)
    }
}

/// Strip characters that are not allowed in component names.
pub fn sanitize_definition_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

struct Walker<'a> {
    options: ReflectOptions<'a>,
    definitions: IndexMap<String, JsonSchema>,
}

impl Walker<'_> {
    fn schema_for(&mut self, shape: &Shape, depth: usize) -> Result<JsonSchema, ReflectError> {
        let schema = match shape {
            Shape::Any | Shape::Upload => JsonSchema::default(),
            Shape::Bool => JsonSchema::typed(SimpleType::Boolean),
            Shape::Integer { format } => JsonSchema {
                format: format.clone(),
                ..JsonSchema::typed(SimpleType::Integer)
            },
            Shape::Number { format } => JsonSchema {
                format: format.clone(),
                ..JsonSchema::typed(SimpleType::Number)
            },
            Shape::String { format } => JsonSchema {
                format: format.clone(),
                ..JsonSchema::typed(SimpleType::String)
            },
            Shape::Array(item) => JsonSchema {
                items: Some(Box::new(self.schema_for(item, depth)?)),
                ..JsonSchema::typed(SimpleType::Array)
            },
            Shape::Map(value) => JsonSchema {
                additional_properties: Some(SchemaOrBool::Schema(Box::new(
                    self.schema_for(value, depth)?,
                ))),
                ..JsonSchema::typed(SimpleType::Object)
            },
            Shape::Nullable(inner) => {
                let mut schema = self.schema_for(inner, depth)?;
                if schema.is_reference() {
                    JsonSchema {
                        any_of: vec![schema, JsonSchema::typed(SimpleType::Null)],
                        ..JsonSchema::default()
                    }
                } else {
                    if schema.schema_type.is_some() {
                        schema.add_type(SimpleType::Null);
                    }
                    schema
                }
            }
            Shape::Struct(s) => self.definition_ref(s, depth)?,
        };
        Ok(schema)
    }

    fn definition_ref(
        &mut self,
        s: &StructShape,
        depth: usize,
    ) -> Result<JsonSchema, ReflectError> {
        let name = sanitize_definition_name(&format!(
            "{}{}",
            self.options.definition_name_prefix, s.name
        ));
        if name.is_empty() {
            return self.struct_schema(s, depth);
        }

        if !self.definitions.contains_key(&name) {
            trace!("collecting definition {}", name);
            // Placeholder first so recursive structs terminate.
            self.definitions.insert(name.clone(), JsonSchema::default());
            let body = self.struct_schema(s, depth)?;
            self.definitions.insert(name.clone(), body);
        }

        Ok(JsonSchema::reference(format!(
            "{}{}",
            self.options.definitions_prefix, name
        )))
    }

    fn struct_schema(&mut self, s: &StructShape, depth: usize) -> Result<JsonSchema, ReflectError> {
        let mut schema = JsonSchema::typed(SimpleType::Object);
        schema.description = s.description.clone();

        let tag_names = self.options.name_tags();
        let tags: Vec<&str> = tag_names.iter().map(String::as_str).collect();

        for field in s.flat_fields(&tags) {
            if field.name == "_" {
                // Sentinel field controlling unknown properties.
                if tags.iter().any(|t| field.tags.contains(t)) {
                    if let Some(value) = field.tags.get("additionalProperties") {
                        let allowed = parse_bool(field, "additionalProperties", value)?;
                        schema.additional_properties = Some(SchemaOrBool::Bool(allowed));
                    }
                }
                continue;
            }

            let Some(name) = self.property_name(field, &tags, depth) else {
                continue;
            };

            let mut prop = self.schema_for(&field.shape, depth + 1)?;
            prop = apply_field_tags(prop, field)?;

            if field.tags.is_true("required") && !schema.required.contains(&name) {
                schema.required.push(name.clone());
            }

            if let Some(hook) = self.options.intercept_prop.as_mut() {
                let ctx = PropertyContext {
                    name: &name,
                    field,
                    depth,
                };
                hook(&ctx, &mut prop)?;
            }

            schema.properties.insert(name, prop);
        }

        Ok(schema)
    }

    fn property_name(&self, field: &Field, tags: &[&str], depth: usize) -> Option<String> {
        if depth == 0 {
            if let Some(mapped) = self.options.property_name_mapping.get(&field.name) {
                return Some(mapped.clone());
            }
        }
        tags.iter()
            .find_map(|t| field.tags.name_for(t))
            .map(str::to_string)
    }
}

/// Apply validation and annotation tags of a field to its property schema.
///
/// A reference cannot carry sibling keywords: a lone `deprecated` becomes the
/// `x-deprecated` extension, anything else wraps the reference in `allOf`.
fn apply_field_tags(prop: JsonSchema, field: &Field) -> Result<JsonSchema, ReflectError> {
    if !prop.is_reference() {
        let mut prop = prop;
        let value_type = primary_type(&prop);
        apply_keywords(&mut prop, field, value_type)?;
        return Ok(prop);
    }

    let mut keywords = JsonSchema::default();
    apply_keywords(&mut keywords, field, None)?;
    if keywords == JsonSchema::default() {
        return Ok(prop);
    }

    let only_deprecated = JsonSchema {
        deprecated: Some(true),
        ..JsonSchema::default()
    };
    if keywords == only_deprecated {
        let mut prop = prop;
        prop.extensions
            .insert(X_DEPRECATED.to_string(), serde_json::Value::Bool(true));
        return Ok(prop);
    }

    keywords.all_of.insert(0, prop);
    Ok(keywords)
}

fn primary_type(schema: &JsonSchema) -> Option<SimpleType> {
    schema
        .schema_type
        .as_ref()?
        .types()
        .into_iter()
        .find(|t| *t != SimpleType::Null)
}

fn apply_keywords(
    target: &mut JsonSchema,
    field: &Field,
    value_type: Option<SimpleType>,
) -> Result<(), ReflectError> {
    let tags = &field.tags;

    if let Some(v) = tags.get("title") {
        target.title = Some(v.to_string());
    }
    if let Some(v) = tags.get("description") {
        target.description = Some(v.to_string());
    }
    if let Some(v) = tags.get("format") {
        target.format = Some(v.to_string());
    }
    if let Some(v) = tags.get("pattern") {
        target.pattern = Some(v.to_string());
    }

    if let Some(v) = tags.get("minimum") {
        target.minimum = Some(parse_f64(field, "minimum", v)?);
    }
    if let Some(v) = tags.get("maximum") {
        target.maximum = Some(parse_f64(field, "maximum", v)?);
    }
    if let Some(v) = tags.get("exclusiveMinimum") {
        target.exclusive_minimum = Some(parse_bool(field, "exclusiveMinimum", v)?);
    }
    if let Some(v) = tags.get("exclusiveMaximum") {
        target.exclusive_maximum = Some(parse_bool(field, "exclusiveMaximum", v)?);
    }
    if let Some(v) = tags.get("multipleOf") {
        target.multiple_of = Some(parse_f64(field, "multipleOf", v)?);
    }

    if let Some(v) = tags.get("minLength") {
        target.min_length = Some(parse_u64(field, "minLength", v)?);
    }
    if let Some(v) = tags.get("maxLength") {
        target.max_length = Some(parse_u64(field, "maxLength", v)?);
    }
    if let Some(v) = tags.get("minItems") {
        target.min_items = Some(parse_u64(field, "minItems", v)?);
    }
    if let Some(v) = tags.get("maxItems") {
        target.max_items = Some(parse_u64(field, "maxItems", v)?);
    }
    if let Some(v) = tags.get("minProperties") {
        target.min_properties = Some(parse_u64(field, "minProperties", v)?);
    }
    if let Some(v) = tags.get("maxProperties") {
        target.max_properties = Some(parse_u64(field, "maxProperties", v)?);
    }
    if let Some(v) = tags.get("uniqueItems") {
        target.unique_items = Some(parse_bool(field, "uniqueItems", v)?);
    }

    if let Some(v) = tags.get("enum") {
        target.enum_values = v
            .split(',')
            .map(|item| parse_value(item.trim(), value_type))
            .collect();
    }
    if let Some(v) = tags.get("default") {
        target.default_value = Some(parse_value(v, value_type));
    }
    if let Some(v) = tags.get("example") {
        target.examples = vec![parse_value(v, value_type)];
    }

    if let Some(v) = tags.get("readOnly") {
        target.read_only = Some(parse_bool(field, "readOnly", v)?);
    }
    if let Some(v) = tags.get("writeOnly") {
        target.write_only = Some(parse_bool(field, "writeOnly", v)?);
    }
    if let Some(v) = tags.get("deprecated") {
        if parse_bool(field, "deprecated", v)? {
            target.deprecated = Some(true);
        }
    }
    if let Some(v) = tags.get("nullable") {
        if parse_bool(field, "nullable", v)? && target.schema_type.is_some() {
            target.add_type(SimpleType::Null);
        }
    }

    Ok(())
}

fn invalid(field: &Field, tag: &str, value: &str) -> ReflectError {
    ReflectError::InvalidTag {
        field: field.name.clone(),
        tag: tag.to_string(),
        value: value.to_string(),
    }
}

fn parse_f64(field: &Field, tag: &str, value: &str) -> Result<f64, ReflectError> {
    value.trim().parse().map_err(|_| invalid(field, tag, value))
}

fn parse_u64(field: &Field, tag: &str, value: &str) -> Result<u64, ReflectError> {
    value.trim().parse().map_err(|_| invalid(field, tag, value))
}

fn parse_bool(field: &Field, tag: &str, value: &str) -> Result<bool, ReflectError> {
    value.trim().parse().map_err(|_| invalid(field, tag, value))
}

/// Interpret a tag literal according to the schema type it annotates.
fn parse_value(raw: &str, value_type: Option<SimpleType>) -> serde_json::Value {
    use serde_json::Value;

    let fallback = || Value::String(raw.to_string());
    match value_type {
        Some(SimpleType::String) => fallback(),
        Some(SimpleType::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| fallback()),
        Some(SimpleType::Number) => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(fallback),
        Some(SimpleType::Boolean) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| fallback()),
        _ => serde_json::from_str(raw).unwrap_or_else(|_| fallback()),
    }
}
