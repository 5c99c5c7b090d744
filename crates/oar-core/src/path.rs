//! Path template parsing and path parameter validation.

use indexmap::IndexSet;

use crate::error::SpecError;
use crate::spec::operation::HttpMethod;
use crate::spec::parameter::{ParameterLocation, ParameterOrRef};

/// A parsed URL path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// The template with `:pattern` suffixes removed.
    pub path: String,
    /// Placeholder names in order of appearance.
    pub placeholders: Vec<String>,
}

impl PathTemplate {
    /// Parse `{name}` and `{name:pattern}` placeholders.
    ///
    /// Patterns may contain balanced braces of their own, e.g.
    /// `{id:[0-9]{4}}`. An unterminated placeholder is kept as literal text.
    pub fn parse(template: &str) -> Self {
        let mut path = String::with_capacity(template.len());
        let mut placeholders = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            path.push_str(&rest[..start]);
            let body = &rest[start + 1..];

            let Some(end) = closing_brace(body) else {
                path.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let inner = &body[..end];
            let name = inner.split_once(':').map_or(inner, |(name, _)| name);
            path.push('{');
            path.push_str(name);
            path.push('}');
            placeholders.push(name.to_string());

            rest = &body[end + 1..];
        }
        path.push_str(rest);

        Self { path, placeholders }
    }

    /// Cross-check declared parameters against the placeholders.
    ///
    /// All problems are collected: duplicated (name, location) pairs, path
    /// parameters missing from the template, and placeholders without a
    /// path parameter. Referenced parameters are not resolved and skipped.
    pub fn validate(
        &self,
        method: HttpMethod,
        parameters: &[ParameterOrRef],
    ) -> Result<(), SpecError> {
        let mut issues = Vec::new();
        let mut seen: IndexSet<(String, ParameterLocation)> = IndexSet::new();
        let mut path_params: IndexSet<&str> = IndexSet::new();

        for param in parameters.iter().filter_map(ParameterOrRef::as_parameter) {
            if !seen.insert((param.name.clone(), param.location)) {
                issues.push(format!(
                    "duplicate parameter in {}: {}",
                    param.location, param.name
                ));
                continue;
            }

            if param.location == ParameterLocation::Path {
                path_params.insert(&param.name);
                if !self.placeholders.contains(&param.name) {
                    issues.push(format!("undefined path parameter: {}", param.name));
                }
            }
        }

        for name in &self.placeholders {
            if !path_params.contains(name.as_str()) {
                issues.push(format!("missing path parameter placeholder in url: {}", name));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SpecError::PathParams {
                method: method.key(),
                path: self.path.clone(),
                issues,
            })
        }
    }
}

/// Index of the brace closing a placeholder whose opening brace was just consumed.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_patterns() {
        let t = PathTemplate::parse("/users/{id:[0-9]+}/files/{name}");
        assert_eq!(t.path, "/users/{id}/files/{name}");
        assert_eq!(t.placeholders, vec!["id", "name"]);
    }

    #[test]
    fn nested_braces_in_pattern() {
        let t = PathTemplate::parse("/year/{year:[0-9]{4}}/summary");
        assert_eq!(t.path, "/year/{year}/summary");
        assert_eq!(t.placeholders, vec!["year"]);
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let t = PathTemplate::parse("/broken/{id");
        assert_eq!(t.path, "/broken/{id");
        assert!(t.placeholders.is_empty());
    }

    #[test]
    fn adjacent_placeholders() {
        let t = PathTemplate::parse("/{month}-{day}-{year}");
        assert_eq!(t.placeholders, vec!["month", "day", "year"]);
        assert_eq!(t.path, "/{month}-{day}-{year}");
    }
}
