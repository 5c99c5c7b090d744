//! Model descriptions standing in for runtime reflection.
//!
//! A request or response model describes itself as a [`Shape`] tree; the
//! reflector walks that tree the way a struct reflector walks fields.

use crate::tags::Tags;

/// The structural type of a model or of one of its fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Unconstrained value.
    Any,
    Bool,
    Integer { format: Option<String> },
    Number { format: Option<String> },
    String { format: Option<String> },
    /// Byte stream capability, e.g. an uploaded file.
    Upload,
    Array(Box<Shape>),
    /// String-keyed map.
    Map(Box<Shape>),
    Nullable(Box<Shape>),
    Struct(StructShape),
}

impl Shape {
    pub fn string() -> Self {
        Shape::String { format: None }
    }

    pub fn string_format(format: impl Into<String>) -> Self {
        Shape::String {
            format: Some(format.into()),
        }
    }

    pub fn integer() -> Self {
        Shape::Integer { format: None }
    }

    pub fn int32() -> Self {
        Shape::Integer {
            format: Some("int32".to_string()),
        }
    }

    pub fn int64() -> Self {
        Shape::Integer {
            format: Some("int64".to_string()),
        }
    }

    pub fn number() -> Self {
        Shape::Number { format: None }
    }

    pub fn array_of(item: Shape) -> Self {
        Shape::Array(Box::new(item))
    }

    pub fn map_of(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    pub fn nullable(inner: Shape) -> Self {
        Shape::Nullable(Box::new(inner))
    }

    /// The shape behind any number of `Nullable` wrappers.
    pub fn deref_nullable(&self) -> &Shape {
        match self {
            Shape::Nullable(inner) => inner.deref_nullable(),
            other => other,
        }
    }

    pub fn as_struct(&self) -> Option<&StructShape> {
        match self.deref_nullable() {
            Shape::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_slice_or_map(&self) -> bool {
        matches!(self.deref_nullable(), Shape::Array(_) | Shape::Map(_))
    }

    /// Struct or map, i.e. something serialized as a JSON object.
    pub fn is_object_like(&self) -> bool {
        matches!(self.deref_nullable(), Shape::Struct(_) | Shape::Map(_))
    }

    /// Whether this is an upload or a list of uploads.
    pub fn is_upload(&self) -> bool {
        match self.deref_nullable() {
            Shape::Upload => true,
            Shape::Array(item) => matches!(item.deref_nullable(), Shape::Upload),
            _ => false,
        }
    }

    /// Element struct of a struct, map-of-struct or array-of-struct shape.
    pub fn element_struct(&self) -> Option<&StructShape> {
        match self.deref_nullable() {
            Shape::Struct(s) => Some(s),
            Shape::Map(inner) | Shape::Array(inner) => inner.element_struct(),
            _ => None,
        }
    }

    /// Whether any (flattened) field carries one of the tags.
    ///
    /// Only struct shapes have fields; everything else reports `false`.
    pub fn has_tagged_fields(&self, tags: &[&str]) -> bool {
        self.as_struct().is_some_and(|s| s.has_tagged_fields(tags))
    }
}

impl From<StructShape> for Shape {
    fn from(value: StructShape) -> Self {
        Shape::Struct(value)
    }
}

/// A named record of fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructShape {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

impl StructShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a plain field with tags in `key:"value"` notation.
    pub fn tagged(self, name: &str, shape: Shape, tags: &str) -> Self {
        self.field(Field::new(name, shape).tags(Tags::parse(tags)))
    }

    /// Embed another struct; its fields are flattened into this one.
    pub fn embed(self, inner: StructShape) -> Self {
        self.field(Field::embedded(inner))
    }

    /// Fields with embedded structs expanded in place.
    ///
    /// An embedded field that names itself through `name_tags` is kept as a
    /// regular field instead of being flattened.
    pub fn flat_fields(&self, name_tags: &[&str]) -> Vec<&Field> {
        let mut out = Vec::with_capacity(self.fields.len());
        self.collect_flat(name_tags, &mut out);
        out
    }

    fn collect_flat<'a>(&'a self, name_tags: &[&str], out: &mut Vec<&'a Field>) {
        for field in &self.fields {
            let named = name_tags.iter().any(|t| field.tags.name_for(t).is_some());
            match (field.embedded, field.shape.as_struct()) {
                (true, Some(inner)) if !named => inner.collect_flat(name_tags, out),
                _ => out.push(field),
            }
        }
    }

    pub fn has_tagged_fields(&self, tags: &[&str]) -> bool {
        self.flat_fields(&[])
            .iter()
            .any(|f| tags.iter().any(|t| f.tags.contains(t)))
    }
}

/// One field of a struct shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub tags: Tags,
    pub embedded: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            tags: Tags::new(),
            embedded: false,
        }
    }

    pub fn embedded(inner: StructShape) -> Self {
        Self {
            name: inner.name.clone(),
            shape: Shape::Struct(inner),
            tags: Tags::new(),
            embedded: true,
        }
    }

    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }
}

/// A typed request or response model.
///
/// The marker methods are optional capabilities a model opts into.
pub trait Model {
    fn shape(&self) -> Shape;

    /// Generate a request body even for methods that usually have none
    /// (GET, HEAD, DELETE, TRACE).
    fn force_request_body(&self) -> bool {
        false
    }

    /// Keep the JSON body even when form fields are present.
    fn force_json_request_body(&self) -> bool {
        false
    }
}

impl Model for Shape {
    fn shape(&self) -> Shape {
        self.clone()
    }
}

impl Model for StructShape {
    fn shape(&self) -> Shape {
        Shape::Struct(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> StructShape {
        StructShape::new("Pagination")
            .tagged("Page", Shape::integer(), r#"query:"page""#)
            .tagged("PerPage", Shape::integer(), r#"query:"per_page""#)
    }

    #[test]
    fn embedded_fields_are_flattened() {
        let s = StructShape::new("ListReq")
            .tagged("Id", Shape::string(), r#"path:"id""#)
            .embed(pagination());
        let names: Vec<_> = s.flat_fields(&["query"]).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Page", "PerPage"]);
        assert!(s.has_tagged_fields(&["query"]));
    }

    #[test]
    fn named_embedded_field_is_kept() {
        let s = StructShape::new("Req").field(Field::embedded(pagination()).tag("json", "paging"));
        let flat = s.flat_fields(&["json"]);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].name, "Pagination");
    }

    #[test]
    fn upload_detection_sees_through_wrappers() {
        assert!(Shape::nullable(Shape::Upload).is_upload());
        assert!(Shape::array_of(Shape::Upload).is_upload());
        assert!(!Shape::string().is_upload());
    }
}
