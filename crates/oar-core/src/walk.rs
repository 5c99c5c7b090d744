//! Extraction of plain validation schemas from committed operations.

use oar_schema::JsonSchema;

use crate::classify::{MIME_FORM_URLENCODED, MIME_MULTIPART};
use crate::error::SpecError;
use crate::operation::In;
use crate::path::PathTemplate;
use crate::reconcile::to_json_schema;
use crate::spec::components::component_ref_name;
use crate::spec::media_type::MediaType;
use crate::spec::operation::{HttpMethod, Operation};
use crate::spec::parameter::{Parameter, ParameterLocation, ParameterOrRef};
use crate::spec::request_body::{RequestBody, RequestBodyOrRef};
use crate::spec::response::{Header, HeaderOrRef, Response, ResponseOrRef};
use crate::spec::spec::Spec;

/// A generic schema for one transmitted value of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedSchema {
    pub location: In,
    /// Parameter or header name, or the content type of a body.
    pub name: String,
    /// Response status key, e.g. `200` or `default`; `None` for requests.
    pub status: Option<String>,
    pub required: bool,
    pub schema: JsonSchema,
}

/// Schemas of every parameter and request body of an operation.
///
/// Path-level parameters apply unless the operation redeclares them.
pub fn request_json_schemas(
    spec: &Spec,
    method: &str,
    path: &str,
) -> Result<Vec<LocatedSchema>, SpecError> {
    let operation = find_operation(spec, method, path)?;
    let mut out = Vec::new();

    let path_level = spec
        .paths
        .get(&PathTemplate::parse(path).path)
        .map(|item| item.parameters.as_slice())
        .unwrap_or_default();
    let own: Vec<&Parameter> = operation
        .parameters
        .iter()
        .filter_map(|p| resolve_parameter(spec, p))
        .collect();
    let inherited = path_level
        .iter()
        .filter_map(|p| resolve_parameter(spec, p))
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        });

    for param in inherited.chain(own.iter().copied()) {
        let schema = param
            .schema
            .as_ref()
            .or_else(|| param.content.values().find_map(|m| m.schema.as_ref()));
        let Some(schema) = schema else {
            continue;
        };
        out.push(LocatedSchema {
            location: location_of(param.location),
            name: param.name.clone(),
            status: None,
            required: param.required,
            schema: to_json_schema(schema, Some(spec)),
        });
    }

    if let Some(body) = operation
        .request_body
        .as_ref()
        .and_then(|b| resolve_request_body(spec, b))
    {
        for (content_type, media_type) in &body.content {
            let location = if content_type.starts_with(MIME_FORM_URLENCODED)
                || content_type.starts_with(MIME_MULTIPART)
            {
                In::FormData
            } else {
                In::Body
            };
            push_content(&mut out, spec, location, content_type, None, body.required, media_type);
        }
    }

    Ok(out)
}

/// Schemas of every response header and response body of an operation.
pub fn response_json_schemas(
    spec: &Spec,
    method: &str,
    path: &str,
) -> Result<Vec<LocatedSchema>, SpecError> {
    let operation = find_operation(spec, method, path)?;
    let mut out = Vec::new();

    for (status, response) in &operation.responses {
        let Some(response) = resolve_response(spec, response) else {
            continue;
        };
        for (name, header) in &response.headers {
            let Some(header) = resolve_header(spec, header) else {
                continue;
            };
            let Some(schema) = &header.schema else {
                continue;
            };
            out.push(LocatedSchema {
                location: In::Header,
                name: name.clone(),
                status: Some(status.clone()),
                required: header.required,
                schema: to_json_schema(schema, Some(spec)),
            });
        }
        for (content_type, media_type) in &response.content {
            push_content(
                &mut out,
                spec,
                In::Body,
                content_type,
                Some(status),
                false,
                media_type,
            );
        }
    }

    Ok(out)
}

fn find_operation<'a>(
    spec: &'a Spec,
    method: &str,
    path: &str,
) -> Result<&'a Operation, SpecError> {
    let method: HttpMethod = method.parse()?;
    spec.operation(method, path)
        .ok_or_else(|| SpecError::OperationNotFound {
            method: method.to_string(),
            path: path.to_string(),
        })
}

fn push_content(
    out: &mut Vec<LocatedSchema>,
    spec: &Spec,
    location: In,
    content_type: &str,
    status: Option<&String>,
    required: bool,
    media_type: &MediaType,
) {
    if let Some(schema) = &media_type.schema {
        out.push(LocatedSchema {
            location,
            name: content_type.to_string(),
            status: status.cloned(),
            required,
            schema: to_json_schema(schema, Some(spec)),
        });
    }
}

fn location_of(location: ParameterLocation) -> In {
    match location {
        ParameterLocation::Query => In::Query,
        ParameterLocation::Header => In::Header,
        ParameterLocation::Path => In::Path,
        ParameterLocation::Cookie => In::Cookie,
    }
}

fn resolve_parameter<'a>(spec: &'a Spec, param: &'a ParameterOrRef) -> Option<&'a Parameter> {
    match param {
        ParameterOrRef::Parameter(p) => Some(p),
        ParameterOrRef::Ref { ref_path } => {
            let name = component_ref_name(ref_path, "parameters")?;
            match spec.components.as_ref()?.parameters.get(name)? {
                ParameterOrRef::Parameter(p) => Some(p),
                ParameterOrRef::Ref { .. } => None,
            }
        }
    }
}

fn resolve_request_body<'a>(spec: &'a Spec, body: &'a RequestBodyOrRef) -> Option<&'a RequestBody> {
    match body {
        RequestBodyOrRef::RequestBody(b) => Some(b),
        RequestBodyOrRef::Ref { ref_path } => {
            let name = component_ref_name(ref_path, "requestBodies")?;
            spec.components
                .as_ref()?
                .request_bodies
                .get(name)?
                .as_request_body()
        }
    }
}

fn resolve_response<'a>(spec: &'a Spec, response: &'a ResponseOrRef) -> Option<&'a Response> {
    match response {
        ResponseOrRef::Response(r) => Some(r),
        ResponseOrRef::Ref { ref_path } => {
            let name = component_ref_name(ref_path, "responses")?;
            spec.components.as_ref()?.responses.get(name)?.as_response()
        }
    }
}

fn resolve_header<'a>(spec: &'a Spec, header: &'a HeaderOrRef) -> Option<&'a Header> {
    match header {
        HeaderOrRef::Header(h) => Some(h),
        HeaderOrRef::Ref { ref_path } => {
            let name = component_ref_name(ref_path, "headers")?;
            match spec.components.as_ref()?.headers.get(name)? {
                HeaderOrRef::Header(h) => Some(h),
                HeaderOrRef::Ref { .. } => None,
            }
        }
    }
}
