use indexmap::{IndexMap, IndexSet};
use log::{trace, warn};
use oar_schema::{JsonSchema, SchemaOrBool, SimpleType, TypeSet, X_DEPRECATED};

use super::to_simple_type;
use crate::spec::components::{COMPONENTS_SCHEMAS, schema_ref_name};
use crate::spec::schema::{AdditionalProperties, Schema, SchemaOrRef};
use crate::spec::spec::Spec;

/// Extension key under which surviving definitions are attached.
pub const COMPONENTS_EXTENSION: &str = "components";

/// Convert an OpenAPI schema into a self-contained generic schema.
///
/// Local references are resolved against `spec` and collected once each.
/// Definitions used from exactly one site and not part of a cycle are
/// inlined there; the rest are attached as `components.schemas`.
/// References that do not resolve are kept as they are.
pub fn to_json_schema(schema: &SchemaOrRef, spec: Option<&Spec>) -> JsonSchema {
    let mut ctx = ToGeneric {
        spec,
        counts: IndexMap::new(),
        definitions: IndexMap::new(),
    };

    let mut root = ctx.convert(schema);
    ctx.inline_single_use(&mut root);

    if !ctx.definitions.is_empty() {
        match serde_json::to_value(&ctx.definitions) {
            Ok(schemas) => {
                root.extensions.insert(
                    COMPONENTS_EXTENSION.to_string(),
                    serde_json::json!({ "schemas": schemas }),
                );
            }
            Err(e) => warn!("dropping collected definitions: {}", e),
        }
    }

    root
}

struct ToGeneric<'a> {
    spec: Option<&'a Spec>,
    counts: IndexMap<String, usize>,
    definitions: IndexMap<String, JsonSchema>,
}

impl<'a> ToGeneric<'a> {
    fn convert(&mut self, schema: &'a SchemaOrRef) -> JsonSchema {
        match schema {
            SchemaOrRef::Any => JsonSchema::default(),
            SchemaOrRef::Never => JsonSchema::never(),
            SchemaOrRef::Ref { ref_path } => self.reference(ref_path),
            SchemaOrRef::Schema(s) => self.schema(s),
        }
    }

    fn reference(&mut self, ref_path: &str) -> JsonSchema {
        let Some((name, target)) = self.spec.and_then(|spec| spec.resolve_schema_ref(ref_path))
        else {
            return JsonSchema::reference(ref_path);
        };

        *self.counts.entry(name.to_string()).or_default() += 1;
        if !self.definitions.contains_key(name) {
            // Placeholder first so cycles terminate.
            self.definitions.insert(name.to_string(), JsonSchema::default());
            let body = self.convert(target);
            self.definitions.insert(name.to_string(), body);
        }

        JsonSchema::reference(format!("{}{}", COMPONENTS_SCHEMAS, name))
    }

    fn schema(&mut self, s: &'a Schema) -> JsonSchema {
        if let Some((ref_path, deprecated)) = wrapped_ref(s) {
            let mut node = self.reference(ref_path);
            node.extensions.extend(s.extensions.clone());
            if deprecated {
                node.extensions
                    .insert(X_DEPRECATED.to_string(), serde_json::Value::Bool(true));
            }
            return node;
        }

        let nullable = s.nullable == Some(true);
        let schema_type = match (s.schema_type, nullable) {
            (Some(t), false) => Some(TypeSet::Single(to_simple_type(t))),
            (Some(t), true) => Some(TypeSet::Multiple(vec![
                to_simple_type(t),
                SimpleType::Null,
            ])),
            (None, true) => Some(TypeSet::Single(SimpleType::Null)),
            (None, false) => None,
        };

        let mut out = JsonSchema {
            schema_type,
            format: s.format.clone(),
            title: s.title.clone(),
            description: s.description.clone(),
            default_value: s.default_value.clone(),
            examples: s.example.iter().cloned().collect(),
            enum_values: s.enum_values.clone(),
            multiple_of: s.multiple_of,
            min_length: s.min_length,
            max_length: s.max_length,
            pattern: s.pattern.clone(),
            min_items: s.min_items,
            max_items: s.max_items,
            unique_items: s.unique_items,
            required: s.required.clone(),
            min_properties: s.min_properties,
            max_properties: s.max_properties,
            read_only: s.read_only,
            write_only: s.write_only,
            deprecated: s.deprecated,
            extensions: s.extensions.clone(),
            ..JsonSchema::default()
        };

        match (s.minimum, s.exclusive_minimum) {
            (_, Some(bound)) => {
                out.minimum = Some(bound);
                out.exclusive_minimum = Some(true);
            }
            (bound, None) => out.minimum = bound,
        }
        match (s.maximum, s.exclusive_maximum) {
            (_, Some(bound)) => {
                out.maximum = Some(bound);
                out.exclusive_maximum = Some(true);
            }
            (bound, None) => out.maximum = bound,
        }

        if let Some(items) = &s.items {
            out.items = Some(Box::new(self.convert(items)));
        }
        for (name, prop) in &s.properties {
            let converted = self.convert(prop);
            out.properties.insert(name.clone(), converted);
        }
        out.additional_properties = match &s.additional_properties {
            Some(AdditionalProperties::Bool(b)) => Some(SchemaOrBool::Bool(*b)),
            Some(AdditionalProperties::Schema(inner)) => {
                Some(SchemaOrBool::Schema(Box::new(self.convert(inner))))
            }
            None => None,
        };
        if let Some(not) = &s.not {
            out.not = Some(Box::new(self.convert(not)));
        }
        out.all_of = s.all_of.iter().map(|c| self.convert(c)).collect();
        out.one_of = s.one_of.iter().map(|c| self.convert(c)).collect();
        out.any_of = s.any_of.iter().map(|c| self.convert(c)).collect();

        if let Some(discriminator) = &s.discriminator {
            if let Ok(value) = serde_json::to_value(discriminator) {
                out.extensions.insert("discriminator".to_string(), value);
            }
        }

        out
    }

    fn inline_single_use(&mut self, root: &mut JsonSchema) {
        let candidates: Vec<String> = self
            .counts
            .iter()
            .filter(|(name, count)| **count == 1 && !self.is_recursive(name))
            .map(|(name, _)| name.clone())
            .collect();
        if candidates.is_empty() {
            return;
        }

        let mut inlined = IndexMap::new();
        for name in candidates {
            if let Some(body) = self.definitions.shift_remove(&name) {
                inlined.insert(name, body);
            }
        }

        substitute(root, &inlined);
        for def in self.definitions.values_mut() {
            substitute(def, &inlined);
        }
    }

    /// Whether `name` can reach itself through references.
    fn is_recursive(&self, name: &str) -> bool {
        let mut stack: Vec<String> = self
            .definitions
            .get(name)
            .map(local_refs)
            .unwrap_or_default();
        let mut visited = IndexSet::new();

        while let Some(next) = stack.pop() {
            if next == name {
                return true;
            }
            if !visited.insert(next.clone()) {
                continue;
            }
            if let Some(def) = self.definitions.get(&next) {
                stack.extend(local_refs(def));
            }
        }
        false
    }
}

/// A reference wrapped to carry site keywords: `allOf: [{$ref}]` with `x-`
/// extensions, or `allOf: [{$ref}, {deprecated: true}]`, and nothing else.
fn wrapped_ref(s: &Schema) -> Option<(&str, bool)> {
    let (ref_path, deprecated) = match s.all_of.as_slice() {
        [SchemaOrRef::Ref { ref_path }] if !s.extensions.is_empty() => (ref_path, false),
        [SchemaOrRef::Ref { ref_path }, SchemaOrRef::Schema(flag)] => {
            let only_flag = Schema {
                deprecated: Some(true),
                ..Schema::default()
            };
            if **flag != only_flag {
                return None;
            }
            (ref_path, true)
        }
        _ => return None,
    };
    let rest = Schema {
        all_of: Vec::new(),
        extensions: IndexMap::new(),
        ..s.clone()
    };
    let vendor_only = s.extensions.keys().all(|key| key.starts_with("x-"));
    (vendor_only && rest == Schema::default()).then_some((ref_path.as_str(), deprecated))
}

/// Names of the local definitions referenced anywhere below `schema`.
fn local_refs(schema: &JsonSchema) -> Vec<String> {
    let mut out = Vec::new();
    collect_refs(schema, &mut out);
    out
}

fn collect_refs(schema: &JsonSchema, out: &mut Vec<String>) {
    if let Some(name) = schema.reference.as_deref().and_then(schema_ref_name) {
        out.push(name.to_string());
    }
    schema.for_each_child(&mut |child| collect_refs(child, out));
}

fn substitute(node: &mut JsonSchema, inlined: &IndexMap<String, JsonSchema>) {
    let target = node
        .reference
        .as_deref()
        .and_then(schema_ref_name)
        .and_then(|name| inlined.get_key_value(name));

    if let Some((name, body)) = target {
        trace!("inlining single-use definition {}", name);
        let site = std::mem::take(&mut node.extensions);
        *node = body.clone();
        for (key, value) in site {
            if key == X_DEPRECATED {
                if value.as_bool() == Some(true) {
                    node.deprecated = Some(true);
                }
            } else {
                node.extensions.insert(key, value);
            }
        }
        // The inlined body may itself reference other single-use definitions.
        substitute(node, inlined);
        return;
    }

    node.for_each_child_mut(&mut |child| substitute(child, inlined));
}
