pub mod classify;
pub mod config;
pub mod error;
pub mod operation;
pub mod path;
pub mod reconcile;
pub mod reflector;
pub mod spec;
pub mod walk;

pub use config::{ReflectorConfig, load_config};
pub use error::{ConfigError, FormatError, ReflectorError, SpecError};
pub use operation::{ContentUnit, In, OperationContext};
pub use reconcile::{from_json_schema, to_json_schema};
pub use reflector::OpenApiReflector;
pub use spec::operation::HttpMethod;
pub use spec::spec::Spec;
