//! Conversion between generic JSON Schema and OpenAPI 3.0 schemas.

mod from_generic;
mod to_generic;

pub use from_generic::{from_json_schema, from_json_schema_definitions};
pub use to_generic::{COMPONENTS_EXTENSION, to_json_schema};

use oar_schema::SimpleType;

use crate::spec::schema::SchemaType;

fn to_simple_type(t: SchemaType) -> SimpleType {
    match t {
        SchemaType::String => SimpleType::String,
        SchemaType::Number => SimpleType::Number,
        SchemaType::Integer => SimpleType::Integer,
        SchemaType::Boolean => SimpleType::Boolean,
        SchemaType::Array => SimpleType::Array,
        SchemaType::Object => SimpleType::Object,
    }
}

fn to_schema_type(t: SimpleType) -> Option<SchemaType> {
    match t {
        SimpleType::String => Some(SchemaType::String),
        SimpleType::Number => Some(SchemaType::Number),
        SimpleType::Integer => Some(SchemaType::Integer),
        SimpleType::Boolean => Some(SchemaType::Boolean),
        SimpleType::Array => Some(SchemaType::Array),
        SimpleType::Object => Some(SchemaType::Object),
        SimpleType::Null => None,
    }
}
