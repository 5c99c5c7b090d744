pub mod error;
pub mod reflect;
pub mod schema;
pub mod shape;
pub mod tags;

pub use error::ReflectError;
pub use reflect::{
    DEFAULT_DEFINITIONS_PREFIX, InterceptProp, PropertyContext, ReflectOptions, Reflector,
    ShapeReflector, sanitize_definition_name,
};
pub use schema::{JsonSchema, SchemaOrBool, SimpleType, TypeSet, X_DEPRECATED};
pub use shape::{Field, Model, Shape, StructShape};
pub use tags::Tags;
