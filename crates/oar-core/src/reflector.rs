//! Assembles operations from content units and commits them to a document.

use indexmap::IndexMap;
use log::{debug, warn};
use oar_schema::{Reflector, ShapeReflector};

use crate::classify::Classifier;
use crate::config::ReflectorConfig;
use crate::error::ReflectorError;
use crate::operation::{ContentUnit, OperationContext};
use crate::spec::operation::{HttpMethod, Operation};
use crate::spec::request_body::{RequestBody, RequestBodyOrRef};
use crate::spec::response::{HeaderOrRef, Response, ResponseOrRef};
use crate::spec::schema::SchemaOrRef;
use crate::spec::spec::Spec;

/// Builds an OpenAPI document from typed operation descriptions.
#[derive(Debug)]
pub struct OpenApiReflector<R: Reflector = ShapeReflector> {
    pub spec: Spec,
    reflector: R,
    config: ReflectorConfig,
}

impl Default for OpenApiReflector {
    fn default() -> Self {
        Self::new(ReflectorConfig::default())
    }
}

impl OpenApiReflector {
    pub fn new(config: ReflectorConfig) -> Self {
        Self::with_reflector(ShapeReflector, config)
    }
}

impl<R: Reflector> OpenApiReflector<R> {
    pub fn with_reflector(reflector: R, config: ReflectorConfig) -> Self {
        Self {
            spec: config.new_spec(),
            reflector,
            config,
        }
    }

    /// Continue building an existing document.
    pub fn with_spec(mut self, spec: Spec) -> Self {
        self.spec = spec;
        self
    }

    pub fn config(&self) -> &ReflectorConfig {
        &self.config
    }

    pub fn into_spec(self) -> Spec {
        self.spec
    }

    /// Reflect every content unit of `ctx` and add the resulting operation.
    ///
    /// The document is only changed when the operation passes validation;
    /// component schemas collected along the way are merged afterwards.
    pub fn add_operation(&mut self, ctx: OperationContext) -> Result<(), ReflectorError> {
        let method: HttpMethod = ctx.method.parse()?;
        let (operation, definitions) = self.assemble(method, &ctx)?;

        self.spec.add_operation(&ctx.method, &ctx.path, operation)?;
        self.merge_definitions(definitions);
        Ok(())
    }

    /// Build the operation without touching the document.
    pub fn assemble(
        &self,
        method: HttpMethod,
        ctx: &OperationContext,
    ) -> Result<(Operation, IndexMap<String, SchemaOrRef>), ReflectorError> {
        let classifier = Classifier::new(&self.reflector, &self.config);
        let mut definitions = IndexMap::new();

        let mut operation = Operation {
            operation_id: ctx.id.clone(),
            summary: ctx.summary.clone(),
            description: ctx.description.clone(),
            tags: ctx.tags.clone(),
            deprecated: ctx.deprecated.then_some(true),
            security: (!ctx.security.is_empty()).then(|| ctx.security.clone()),
            ..Operation::default()
        };

        let mut body: Option<RequestBody> = None;
        for unit in &ctx.request {
            let parts = classifier.classify_request(method, unit)?;
            operation
                .parameters
                .extend(parts.parameters.into_iter().map(Into::into));
            operation.extensions.extend(parts.extensions);
            absorb(&mut definitions, parts.definitions);

            if parts.content.is_empty() {
                continue;
            }
            let body = body.get_or_insert_with(RequestBody::default);
            for (content_type, mut media_type) in parts.content {
                if let Some(customize) = &unit.customize {
                    customize(&mut media_type);
                }
                body.content.insert(content_type, media_type);
            }
            if !unit.description.is_empty() {
                body.description = Some(unit.description.clone());
            }
        }
        operation.request_body = body.map(RequestBodyOrRef::RequestBody);

        for unit in &ctx.response {
            let parts = classifier.classify_response(method, unit)?;
            absorb(&mut definitions, parts.definitions);

            let key = unit.status_key();
            let slot = operation
                .responses
                .entry(key)
                .or_insert_with(|| ResponseOrRef::Response(Response::default()));
            let ResponseOrRef::Response(response) = slot else {
                continue;
            };

            for (name, header) in parts.headers {
                response.headers.insert(name, HeaderOrRef::Header(header));
            }
            for (content_type, mut media_type) in parts.content {
                if let Some(customize) = &unit.customize {
                    customize(&mut media_type);
                }
                response.content.insert(content_type, media_type);
            }

            if !unit.description.is_empty() {
                response.description = unit.description.clone();
            } else if response.description.is_empty() {
                response.description = default_description(unit);
            }
        }

        Ok((operation, definitions))
    }

    /// Merge component schemas; an existing name keeps its schema.
    fn merge_definitions(&mut self, definitions: IndexMap<String, SchemaOrRef>) {
        if definitions.is_empty() {
            return;
        }
        let schemas = self.spec.schemas_ens();
        for (name, schema) in definitions {
            match schemas.get(&name) {
                Some(existing) if *existing != schema => {
                    warn!(
                        "definition {} already exists with a different shape, keeping the first",
                        name
                    );
                }
                Some(_) => {}
                None => {
                    debug!("adding definition {}", name);
                    schemas.insert(name, schema);
                }
            }
        }
    }
}

fn absorb(into: &mut IndexMap<String, SchemaOrRef>, from: IndexMap<String, SchemaOrRef>) {
    for (name, schema) in from {
        into.entry(name).or_insert(schema);
    }
}

fn default_description(unit: &ContentUnit) -> String {
    let text = match (unit.http_status, unit.is_range) {
        (Some(class), true) => class_text(class),
        (Some(status), false) => status_text(status),
        (None, _) if unit.is_default => "Default response",
        (None, _) => status_text(200),
    };
    if text.is_empty() {
        "Response".to_string()
    } else {
        text.to_string()
    }
}

fn class_text(class: u16) -> &'static str {
    match class {
        1 => "Informational",
        2 => "Successful",
        3 => "Redirection",
        4 => "Client Error",
        5 => "Server Error",
        _ => "",
    }
}

/// Reason phrase of an HTTP status code.
fn status_text(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
