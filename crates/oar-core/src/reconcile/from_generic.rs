use indexmap::IndexMap;
use oar_schema::{JsonSchema, SchemaOrBool, SimpleType, X_DEPRECATED};

use super::to_schema_type;
use crate::spec::schema::{AdditionalProperties, Discriminator, Schema, SchemaOrRef};

/// Convert a generic schema into an OpenAPI 3.0 schema.
///
/// Never produces the boolean shorthand. A reference with `x-` extensions
/// beside it becomes `allOf: [{$ref}]` carrying those extensions, and a
/// deprecated one gains a `{deprecated: true}` member. Collected
/// `definitions` are not part of the result, see
/// [`from_json_schema_definitions`].
pub fn from_json_schema(schema: &JsonSchema) -> SchemaOrRef {
    if let Some(ref_path) = &schema.reference {
        let reference = SchemaOrRef::reference(ref_path.clone());
        let deprecated = schema.is_deprecated_site();
        let extensions: IndexMap<String, serde_json::Value> = schema
            .extensions
            .iter()
            .filter(|(key, _)| key.starts_with("x-") && key.as_str() != X_DEPRECATED)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !deprecated && extensions.is_empty() {
            return reference;
        }

        // `$ref` siblings are ignored in 3.0, so the site keywords go on a wrapper.
        let mut all_of = vec![reference];
        if deprecated {
            all_of.push(
                Schema {
                    deprecated: Some(true),
                    ..Schema::default()
                }
                .into(),
            );
        }
        return Schema {
            all_of,
            extensions,
            ..Schema::default()
        }
        .into();
    }

    let mut out = Schema {
        format: schema.format.clone(),
        title: schema.title.clone(),
        description: schema.description.clone(),
        default_value: schema.default_value.clone(),
        enum_values: schema.enum_values.clone(),
        multiple_of: schema.multiple_of,
        min_length: schema.min_length,
        max_length: schema.max_length,
        pattern: schema.pattern.clone(),
        min_items: schema.min_items,
        max_items: schema.max_items,
        unique_items: schema.unique_items,
        required: schema.required.clone(),
        min_properties: schema.min_properties,
        max_properties: schema.max_properties,
        read_only: schema.read_only,
        write_only: schema.write_only,
        deprecated: schema.deprecated,
        example: schema.examples.first().cloned(),
        ..Schema::default()
    };

    if let Some(types) = &schema.schema_type {
        let types = types.types();
        if types.contains(&SimpleType::Null) {
            out.nullable = Some(true);
        }
        let concrete: Vec<_> = types.into_iter().filter_map(to_schema_type).collect();
        match concrete.as_slice() {
            [] => {}
            [single] => out.schema_type = Some(*single),
            many => {
                out.any_of = many
                    .iter()
                    .map(|t| {
                        Schema {
                            schema_type: Some(*t),
                            ..Schema::default()
                        }
                        .into()
                    })
                    .collect();
            }
        }
    }

    if schema.exclusive_minimum == Some(true) {
        out.exclusive_minimum = schema.minimum;
    } else {
        out.minimum = schema.minimum;
    }
    if schema.exclusive_maximum == Some(true) {
        out.exclusive_maximum = schema.maximum;
    } else {
        out.maximum = schema.maximum;
    }

    out.items = schema
        .items
        .as_deref()
        .map(|items| Box::new(from_json_schema(items)));
    out.properties = schema
        .properties
        .iter()
        .map(|(name, prop)| (name.clone(), from_json_schema(prop)))
        .collect();
    out.additional_properties = match &schema.additional_properties {
        Some(SchemaOrBool::Bool(b)) => Some(AdditionalProperties::Bool(*b)),
        Some(SchemaOrBool::Schema(inner)) => Some(AdditionalProperties::Schema(Box::new(
            from_json_schema(inner),
        ))),
        None => None,
    };
    out.not = schema
        .not
        .as_deref()
        .map(|not| Box::new(from_json_schema(not)));
    out.all_of.extend(schema.all_of.iter().map(from_json_schema));
    out.one_of = schema.one_of.iter().map(from_json_schema).collect();
    out.any_of.extend(schema.any_of.iter().map(from_json_schema));

    for (key, value) in &schema.extensions {
        if key == X_DEPRECATED {
            if value.as_bool() == Some(true) {
                out.deprecated = Some(true);
            }
        } else if key == "discriminator" {
            out.discriminator = serde_json::from_value::<Discriminator>(value.clone()).ok();
        } else if key.starts_with("x-") {
            out.extensions.insert(key.clone(), value.clone());
        }
    }

    out.into()
}

/// Convert every collected definition of a reflected schema.
pub fn from_json_schema_definitions(
    definitions: &IndexMap<String, JsonSchema>,
) -> IndexMap<String, SchemaOrRef> {
    definitions
        .iter()
        .map(|(name, def)| (name.clone(), from_json_schema(def)))
        .collect()
}
