use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scheme names with the scopes an operation requires from each.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecuritySchemeType {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// A `components.securitySchemes` entry.
///
/// Which optional fields apply depends on `type`: `name`/`in` for API keys,
/// `scheme`/`bearerFormat` for HTTP, `flows` for OAuth2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ApiKeyLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl SecurityScheme {
    fn of_type(scheme_type: SecuritySchemeType) -> Self {
        Self {
            scheme_type,
            description: None,
            name: None,
            location: None,
            scheme: None,
            bearer_format: None,
            flows: None,
            open_id_connect_url: None,
            extensions: IndexMap::new(),
        }
    }

    /// HTTP authentication, e.g. `basic` or `bearer`.
    pub fn http(scheme: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            ..Self::of_type(SecuritySchemeType::Http)
        }
    }

    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        Self {
            name: Some(name.into()),
            location: Some(location),
            ..Self::of_type(SecuritySchemeType::ApiKey)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth2_flows_use_camel_case() {
        let yaml = r#"
type: oauth2
flows:
  clientCredentials:
    tokenUrl: https://auth.example.com/token
    scopes:
      read: Read access
"#;
        let scheme: SecurityScheme = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(scheme.scheme_type, SecuritySchemeType::OAuth2);
        let flow = scheme.flows.unwrap().client_credentials.unwrap();
        assert_eq!(flow.token_url.as_deref(), Some("https://auth.example.com/token"));
        assert_eq!(flow.scopes["read"], "Read access");
    }
}
