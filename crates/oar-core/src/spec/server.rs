use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A server the API is reachable at. The URL may contain `{variable}`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
            extensions: IndexMap::new(),
        }
    }

    /// Declare a URL variable with its default value.
    pub fn variable(mut self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.variables.insert(
            name.into(),
            ServerVariable {
                default: default.into(),
                ..ServerVariable::default()
            },
        );
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
