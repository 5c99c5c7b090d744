use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("invalid `{tag}` tag value {value:?} on field {field}")]
    InvalidTag {
        field: String,
        tag: String,
        value: String,
    },

    #[error("intercepting property {property}: {message}")]
    Intercept { property: String, message: String },
}
