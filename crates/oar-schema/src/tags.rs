use std::fmt;

use indexmap::IndexMap;

/// Field tags: ordered `key → value` pairs attached to a model field.
///
/// Tags drive where a field is transmitted (`path`, `query`, `header`,
/// `cookie`, `form`, `formData`, `json`) and which validation keywords its
/// schema carries (`minimum`, `pattern`, `required`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(IndexMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the conventional `key:"value" other:"value"` notation.
    ///
    /// Malformed trailing input is ignored; values may contain spaces and
    /// escaped quotes.
    pub fn parse(input: &str) -> Self {
        let mut tags = IndexMap::new();
        let mut rest = input.trim_start();

        while !rest.is_empty() {
            let Some(colon) = rest.find(':') else { break };
            let key = rest[..colon].trim();
            rest = &rest[colon + 1..];
            if key.is_empty() || key.contains(char::is_whitespace) || !rest.starts_with('"') {
                break;
            }
            rest = &rest[1..];

            let mut value = String::new();
            let mut closed = false;
            let mut chars = rest.char_indices();
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        rest = &rest[i + 1..];
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                break;
            }
            tags.insert(key.to_string(), value);
            rest = rest.trim_start();
        }

        Self(tags)
    }

    /// Set a tag, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether the tag is set to `"true"`.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// The property name a tag assigns: text before the first comma.
    ///
    /// Returns `None` for a missing tag, an empty name or `-`.
    pub fn name_for(&self, key: &str) -> Option<&str> {
        let value = self.get(key)?;
        let name = value.split(',').next().unwrap_or_default();
        match name {
            "" | "-" => None,
            _ => Some(name),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Tags {
    fn from(value: &str) -> Self {
        Tags::parse(value)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}:{:?}", k, v)?;
        }
        Ok(())
    }
}
