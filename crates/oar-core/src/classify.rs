//! Placement of model fields into parameters, headers and bodies.

use indexmap::{IndexMap, IndexSet};
use log::trace;
use oar_schema::{
    Field, JsonSchema, Model, ReflectError, ReflectOptions, Reflector, SchemaOrBool, Shape,
    SimpleType,
};

use crate::config::ReflectorConfig;
use crate::operation::{ContentUnit, In};
use crate::reconcile::from_json_schema;
use crate::spec::media_type::MediaType;
use crate::spec::operation::HttpMethod;
use crate::spec::parameter::{Parameter, ParameterStyle};
use crate::spec::response::Header;
use crate::spec::schema::{Schema, SchemaOrRef, SchemaType};

pub const MIME_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MIME_MULTIPART: &str = "multipart/form-data";

/// Operation extension prefix flagging locations that reject unknown parameters.
pub const X_FORBID_UNKNOWN: &str = "x-forbid-unknown-";

const TAG_JSON: &str = "json";
const TAG_FORM: &str = "form";
const TAG_FORM_DATA: &str = "formData";

/// Parameter locations in the order they are emitted.
const PARAMETER_LOCATIONS: [In; 4] = [In::Query, In::Path, In::Cookie, In::Header];

/// What one request content unit contributes to an operation.
#[derive(Debug, Default)]
pub struct RequestParts {
    pub parameters: Vec<Parameter>,
    /// Request body media types by content type.
    pub content: IndexMap<String, MediaType>,
    /// A field of the form body is a file upload.
    pub has_file_upload: bool,
    /// Operation-level vendor extensions.
    pub extensions: IndexMap<String, serde_json::Value>,
    /// Component schemas the generated schemas refer to.
    pub definitions: IndexMap<String, SchemaOrRef>,
}

/// What one response content unit contributes to an operation.
#[derive(Debug, Default)]
pub struct ResponseParts {
    pub headers: IndexMap<String, Header>,
    pub content: IndexMap<String, MediaType>,
    pub definitions: IndexMap<String, SchemaOrRef>,
}

enum BodyKind {
    /// No declared content type: parameters plus JSON and form bodies.
    Auto,
    Json,
    Form,
    Raw(String),
}

/// A property captured at the top level of a reflected model.
struct Captured {
    name: String,
    field: Field,
    schema: JsonSchema,
}

/// Decides where the fields of a content unit are transmitted.
pub struct Classifier<'a, R: Reflector + ?Sized> {
    reflector: &'a R,
    config: &'a ReflectorConfig,
}

impl<'a, R: Reflector + ?Sized> Classifier<'a, R> {
    pub fn new(reflector: &'a R, config: &'a ReflectorConfig) -> Self {
        Self { reflector, config }
    }

    /// Parameters and body of one request content unit.
    pub fn classify_request(
        &self,
        method: HttpMethod,
        unit: &ContentUnit,
    ) -> Result<RequestParts, ReflectError> {
        let mut out = RequestParts::default();
        let Some(model) = unit.model.as_deref() else {
            return Ok(out);
        };
        let shape = model.shape();
        let with_body = !method.is_bodyless() || model.force_request_body();

        let kind = self.body_kind(&unit.content_type);
        if let BodyKind::Raw(content_type) = kind {
            if with_body {
                let schema = self.raw_schema(&shape, &mut out.definitions)?;
                out.content
                    .insert(content_type, MediaType::with_schema(schema));
            }
            return Ok(out);
        }

        for location in PARAMETER_LOCATIONS {
            self.parameters_in(&shape, unit, location, &mut out)?;
        }

        if !with_body {
            trace!("{} request without forced body, skipping body", method);
            return Ok(out);
        }

        if matches!(kind, BodyKind::Auto | BodyKind::Json) {
            self.json_body(model, &shape, &mut out)?;
        }
        if matches!(kind, BodyKind::Auto | BodyKind::Form) {
            let multipart = unit.content_type.starts_with(MIME_MULTIPART);
            self.form_body(&shape, unit, multipart, &mut out)?;
        }

        Ok(out)
    }

    /// Headers and body of one response content unit.
    pub fn classify_response(
        &self,
        method: HttpMethod,
        unit: &ContentUnit,
    ) -> Result<ResponseParts, ReflectError> {
        let mut out = ResponseParts::default();
        let content_type = media_type_of(&unit.content_type);
        let explicit = !content_type.is_empty() && content_type != self.config.json_content_type;

        let Some(model) = unit.model.as_deref() else {
            if explicit && method != HttpMethod::Head {
                out.content.insert(
                    content_type.to_string(),
                    MediaType::with_schema(string_schema()),
                );
            }
            return Ok(out);
        };
        let shape = model.shape();

        self.response_headers(&shape, unit, &mut out)?;
        if method == HttpMethod::Head {
            return Ok(out);
        }

        let content_type = if explicit {
            content_type.to_string()
        } else {
            self.config.json_content_type.clone()
        };

        let json_eligible = shape
            .as_struct()
            .is_none_or(|s| s.has_tagged_fields(&[TAG_JSON]));
        if json_eligible {
            let root = self.reflector.reflect(&shape, self.body_options("", true))?;
            self.stage(&root.definitions, &[&root], &mut out.definitions);
            out.content
                .insert(content_type, MediaType::with_schema(from_json_schema(&root)));
        } else if explicit {
            let schema = self.raw_schema(&shape, &mut out.definitions)?;
            out.content.insert(content_type, MediaType::with_schema(schema));
        }

        Ok(out)
    }

    fn body_kind(&self, content_type: &str) -> BodyKind {
        let media_type = media_type_of(content_type);
        if media_type.is_empty() {
            BodyKind::Auto
        } else if media_type == self.config.json_content_type {
            BodyKind::Json
        } else if media_type == MIME_FORM_URLENCODED || media_type == MIME_MULTIPART {
            BodyKind::Form
        } else {
            BodyKind::Raw(media_type.to_string())
        }
    }

    fn body_options(&self, name_prefix: &str, root_ref: bool) -> ReflectOptions<'static> {
        ReflectOptions::default()
            .definitions_prefix(&self.config.definitions_prefix)
            .definition_name_prefix(name_prefix)
            .root_ref(root_ref)
    }

    /// Reflect the fields tagged for `location` into parameters.
    fn parameters_in(
        &self,
        shape: &Shape,
        unit: &ContentUnit,
        location: In,
        out: &mut RequestParts,
    ) -> Result<(), ReflectError> {
        let Some(param_location) = location.parameter_location() else {
            return Ok(());
        };
        // Fields tagged `form` are query parameters as well as form body properties.
        let additional: &[&str] = if location == In::Query { &[TAG_FORM] } else { &[] };
        let mapping = unit.mapping(location);

        let Some(s) = shape.as_struct() else {
            return Ok(());
        };
        let mut tags = vec![location.tag()];
        tags.extend_from_slice(additional);
        if !s.has_tagged_fields(&tags) && mapping.is_empty() {
            return Ok(());
        }

        let options = ReflectOptions::with_tag(location.tag())
            .additional_tags(additional)
            .definitions_prefix(&self.config.definitions_prefix)
            .definition_name_prefix(location.definition_prefix())
            .property_name_mapping(mapping);
        let (root, captured) = self.reflect_captured(shape, options)?;

        let mut kept = Vec::new();
        for Captured {
            name,
            field,
            mut schema,
        } in captured
        {
            // Uploads only travel in a multipart body.
            if field.shape.is_upload() {
                continue;
            }
            let param_name = if location == In::Header {
                canonical_header_key(&name)
            } else {
                name.clone()
            };

            let mut param = Parameter::new(param_name, param_location);
            param.description = schema.description.take();
            param.required = location == In::Path || root.required.contains(&name);
            if schema.deprecated == Some(true) {
                param.deprecated = Some(true);
            }
            if let Some(format) = field.tags.get("collectionFormat") {
                if let Some((style, explode)) = collection_format(format) {
                    param.style = Some(style);
                    param.explode = Some(explode);
                }
            }

            if field.shape.is_object_like() && location != In::Path {
                if is_json_encoded(&field.shape, location) {
                    let encoded = self
                        .reflector
                        .reflect(&field.shape, self.body_options("", false))?;
                    self.stage(&encoded.definitions, &[&encoded], &mut out.definitions);
                    param.content.insert(
                        self.config.json_content_type.clone(),
                        MediaType::with_schema(from_json_schema(&encoded)),
                    );
                    out.parameters.push(param);
                    continue;
                }
                param.style = Some(ParameterStyle::DeepObject);
                param.explode = Some(true);
            }

            param.schema = Some(from_json_schema(&schema));
            out.parameters.push(param);
            kept.push(schema);
        }

        let roots: Vec<&JsonSchema> = kept.iter().collect();
        self.stage(&root.definitions, &roots, &mut out.definitions);

        let forbids_unknown = matches!(
            root.additional_properties,
            Some(SchemaOrBool::Bool(false))
        );
        if forbids_unknown && matches!(location, In::Query | In::Cookie) {
            out.extensions.insert(
                format!("{}{}", X_FORBID_UNKNOWN, location.tag()),
                serde_json::Value::Bool(true),
            );
        }

        Ok(())
    }

    fn json_body(
        &self,
        model: &dyn Model,
        shape: &Shape,
        out: &mut RequestParts,
    ) -> Result<(), ReflectError> {
        if shape.has_tagged_fields(&[TAG_FORM_DATA, TAG_FORM]) && !model.force_json_request_body()
        {
            return Ok(());
        }
        if !shape.has_tagged_fields(&[TAG_JSON]) && !shape.is_slice_or_map() {
            return Ok(());
        }

        let root = self.reflector.reflect(shape, self.body_options("", true))?;
        self.stage(&root.definitions, &[&root], &mut out.definitions);
        out.content.insert(
            self.config.json_content_type.clone(),
            MediaType::with_schema(from_json_schema(&root)),
        );
        Ok(())
    }

    fn form_body(
        &self,
        shape: &Shape,
        unit: &ContentUnit,
        multipart: bool,
        out: &mut RequestParts,
    ) -> Result<(), ReflectError> {
        let mapping = unit.mapping(In::FormData);
        if !shape.has_tagged_fields(&[TAG_FORM_DATA, TAG_FORM]) && mapping.is_empty() {
            return Ok(());
        }

        let mut has_upload = false;
        let options = ReflectOptions::with_tag(TAG_FORM_DATA)
            .additional_tags(&[TAG_FORM])
            .definitions_prefix(&self.config.definitions_prefix)
            .definition_name_prefix(&self.config.form_definition_prefix)
            .root_ref(true)
            .property_name_mapping(mapping)
            .intercept_prop(|ctx, schema| {
                if ctx.field.shape.is_upload() {
                    mark_upload(schema);
                    has_upload = true;
                }
                Ok(())
            });
        let root = self.reflector.reflect(shape, options)?;

        self.stage(&root.definitions, &[&root], &mut out.definitions);
        let content_type = if has_upload || multipart {
            MIME_MULTIPART
        } else {
            MIME_FORM_URLENCODED
        };
        out.has_file_upload |= has_upload;
        out.content.insert(
            content_type.to_string(),
            MediaType::with_schema(from_json_schema(&root)),
        );
        Ok(())
    }

    fn response_headers(
        &self,
        shape: &Shape,
        unit: &ContentUnit,
        out: &mut ResponseParts,
    ) -> Result<(), ReflectError> {
        let mapping = unit.mapping(In::Header);
        let tagged = shape.has_tagged_fields(&[In::Header.tag()]);
        if shape.as_struct().is_none() || (!tagged && mapping.is_empty()) {
            return Ok(());
        }

        let options = ReflectOptions::with_tag(In::Header.tag())
            .definitions_prefix(&self.config.definitions_prefix)
            .definition_name_prefix(In::Header.definition_prefix())
            .property_name_mapping(mapping);
        let (root, captured) = self.reflect_captured(shape, options)?;

        let mut kept = Vec::new();
        for Captured {
            name, mut schema, ..
        } in captured
        {
            let header = Header {
                description: schema.description.take(),
                required: root.required.contains(&name),
                deprecated: schema.deprecated.filter(|d| *d),
                schema: Some(from_json_schema(&schema)),
            };
            out.headers.insert(canonical_header_key(&name), header);
            kept.push(schema);
        }

        let roots: Vec<&JsonSchema> = kept.iter().collect();
        self.stage(&root.definitions, &roots, &mut out.definitions);
        Ok(())
    }

    /// Reflect `shape` inline, recording every top-level property.
    fn reflect_captured(
        &self,
        shape: &Shape,
        options: ReflectOptions<'_>,
    ) -> Result<(JsonSchema, Vec<Captured>), ReflectError> {
        let mut captured = Vec::new();
        let options = options.intercept_prop(|ctx, schema| {
            if ctx.depth == 0 {
                captured.push(Captured {
                    name: ctx.name.to_string(),
                    field: ctx.field.clone(),
                    schema: schema.clone(),
                });
            }
            Ok(())
        });
        let root = self.reflector.reflect(shape, options)?;
        Ok((root, captured))
    }

    /// Schema of a body sent as-is with a non-JSON content type.
    fn raw_schema(
        &self,
        shape: &Shape,
        definitions: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<SchemaOrRef, ReflectError> {
        if shape.is_upload() && !shape.is_slice_or_map() {
            let mut schema = JsonSchema::default();
            mark_upload(&mut schema);
            return Ok(from_json_schema(&schema));
        }
        if shape.as_struct().is_some() || matches!(shape.deref_nullable(), Shape::Any) {
            return Ok(string_schema());
        }
        let root = self.reflector.reflect(shape, self.body_options("", false))?;
        self.stage(&root.definitions, &[&root], definitions);
        Ok(from_json_schema(&root))
    }

    /// Stage the definitions reachable from `roots`; earlier entries win.
    fn stage(
        &self,
        definitions: &IndexMap<String, JsonSchema>,
        roots: &[&JsonSchema],
        staged: &mut IndexMap<String, SchemaOrRef>,
    ) {
        let mut pending = Vec::new();
        for root in roots {
            self.collect_refs(root, &mut pending);
        }

        let mut reachable = IndexSet::new();
        while let Some(name) = pending.pop() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            if let Some(def) = definitions.get(&name) {
                self.collect_refs(def, &mut pending);
            }
        }

        for (name, def) in definitions {
            if reachable.contains(name) && !staged.contains_key(name) {
                staged.insert(name.clone(), from_json_schema(def));
            }
        }
    }

    fn collect_refs(&self, schema: &JsonSchema, out: &mut Vec<String>) {
        if let Some(name) = schema
            .reference
            .as_deref()
            .and_then(|r| r.strip_prefix(self.config.definitions_prefix.as_str()))
        {
            out.push(name.to_string());
        }
        schema.for_each_child(&mut |child| self.collect_refs(child, out));
    }
}

/// Media type without parameters, e.g. `text/plain` for `text/plain; charset=utf-8`.
fn media_type_of(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// `x-request-id` becomes `X-Request-Id`.
fn canonical_header_key(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Style and explode of a legacy `collectionFormat` value.
fn collection_format(format: &str) -> Option<(ParameterStyle, bool)> {
    match format {
        "csv" => Some((ParameterStyle::Form, false)),
        "ssv" => Some((ParameterStyle::SpaceDelimited, false)),
        "pipes" => Some((ParameterStyle::PipeDelimited, false)),
        "multi" => Some((ParameterStyle::Form, true)),
        _ => None,
    }
}

/// Object parameters whose element type is a JSON document rather than a
/// set of location-tagged fields are sent as JSON content.
fn is_json_encoded(shape: &Shape, location: In) -> bool {
    shape.element_struct().is_some_and(|s| {
        s.has_tagged_fields(&[TAG_JSON]) && !s.has_tagged_fields(&[location.tag()])
    })
}

fn mark_upload(schema: &mut JsonSchema) {
    let binary = JsonSchema {
        format: Some("binary".to_string()),
        ..JsonSchema::typed(SimpleType::String)
    };
    if schema.has_type(SimpleType::Array) {
        schema.items = Some(Box::new(binary));
    } else {
        let description = schema.description.take();
        *schema = binary;
        schema.description = description;
    }
}

fn string_schema() -> SchemaOrRef {
    Schema {
        schema_type: Some(SchemaType::String),
        ..Schema::default()
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(media_type_of("text/plain; charset=utf-8"), "text/plain");
        assert_eq!(media_type_of(""), "");
    }

    #[test]
    fn header_keys_are_canonical() {
        assert_eq!(canonical_header_key("x-request-id"), "X-Request-Id");
        assert_eq!(canonical_header_key("ETag"), "Etag");
        assert_eq!(canonical_header_key("Authorization"), "Authorization");
    }

    #[test]
    fn legacy_collection_formats() {
        assert_eq!(
            collection_format("csv"),
            Some((ParameterStyle::Form, false))
        );
        assert_eq!(
            collection_format("ssv"),
            Some((ParameterStyle::SpaceDelimited, false))
        );
        assert_eq!(
            collection_format("pipes"),
            Some((ParameterStyle::PipeDelimited, false))
        );
        assert_eq!(
            collection_format("multi"),
            Some((ParameterStyle::Form, true))
        );
        assert_eq!(collection_format("tsv"), None);
    }

    #[test]
    fn upload_array_keeps_array_type() {
        let mut schema = JsonSchema {
            items: Some(Box::default()),
            ..JsonSchema::typed(SimpleType::Array)
        };
        mark_upload(&mut schema);
        assert!(schema.has_type(SimpleType::Array));
        assert_eq!(
            schema.items.as_ref().and_then(|i| i.format.as_deref()),
            Some("binary")
        );
    }
}
