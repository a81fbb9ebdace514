//! Typed values produced by the literal grammar.

use crate::enums::EnumValue;
use crate::error::{CfgError, CfgResult};
use crate::section::Section;
use indexmap::IndexMap;
use regex_lite::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Ordered map literal.
pub type Map = IndexMap<String, Value>;

/// A configuration value.
///
/// `Ref` only appears in parsed, not yet resolved field maps; resolved field
/// maps never contain it.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Pattern(Regex),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(Map),
    Ref(Reference),
    Section(Rc<Section>),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Pattern(_) => "pattern",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Ref(_) => "reference",
            Value::Section(_) => "section",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            Value::Pattern(re) => Some(re),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Rc<Section>> {
        match self {
            Value::Section(section) => Some(section),
            _ => None,
        }
    }

    /// Whether a path may continue below this value.
    pub fn is_navigable(&self) -> bool {
        matches!(self, Value::Section(_) | Value::Map(_) | Value::List(_))
    }

    /// Convert to JSON, resolving nested sections.
    ///
    /// Patterns become their source text and enum members become
    /// `Type.Member` strings.
    pub fn to_json(&self) -> CfgResult<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::Null => Json::Null,
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bool(b) => Json::Bool(*b),
            Value::String(s) => Json::String(s.clone()),
            Value::Pattern(re) => Json::String(re.as_str().to_string()),
            Value::Enum(e) => Json::String(e.to_string()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<CfgResult<Vec<_>>>()?,
            ),
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json()?);
                }
                Json::Object(out)
            }
            Value::Ref(reference) => {
                return Err(CfgError::unresolvable(
                    &reference.to_string(),
                    "reference was not resolved",
                ));
            }
            Value::Section(section) => section.to_json()?,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str() == b.as_str(),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            (Value::Section(a), Value::Section(b)) => {
                Rc::ptr_eq(a, b) || (a.file() == b.file() && a.id() == b.id())
            }
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Pattern(re) => write!(f, "pattern:{}", re.as_str()),
            Value::Enum(e) => write!(f, "enum:{}", e),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Ref(reference) => write!(f, "{}", reference),
            Value::Section(section) => write!(f, "<{}>", section.id()),
        }
    }
}

/// Unresolved pointer to a section or field.
///
/// `path` is `class::name` followed by optional `/field` segments. When
/// `sibling` is set the path is looked up in `<sibling>.<ext>` next to the
/// origin file instead of the origin file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    origin: PathBuf,
    path: String,
    sibling: Option<String>,
}

impl Reference {
    pub fn new(origin: impl Into<PathBuf>, path: impl Into<String>, sibling: Option<String>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            sibling,
        }
    }

    /// Interpret `token` as `class::name[/path][@file]`.
    ///
    /// Returns `Ok(None)` when the token has no `class::` prefix.
    pub fn parse(origin: &Path, token: &str) -> CfgResult<Option<Self>> {
        let (path, sibling) = match token.split_once('@') {
            Some((path, file)) if !file.contains('@') => (path, Some(file.trim())),
            _ => (token, None),
        };

        let mut segments = path.split('/').map(str::trim);
        let head = segments.next().unwrap_or_default();
        let Some((class, name)) = split_identifier(head)? else {
            return Ok(None);
        };
        let sibling = match sibling {
            Some("") => return Err(CfgError::malformed_identifier(token)),
            other => other.map(str::to_string),
        };

        let mut normalized = format!("{}::{}", class, name);
        for segment in segments {
            normalized.push('/');
            normalized.push_str(segment);
        }
        Ok(Some(Self::new(origin, normalized, sibling)))
    }

    /// File the reference was written in.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// `class::name[/field...]`, without the `@file` suffix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Base name of the sibling file, for cross-file references.
    pub fn sibling(&self) -> Option<&str> {
        self.sibling.as_deref()
    }

    /// The `class::name` part of the path.
    pub fn section_id(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sibling {
            Some(ref file) => write!(f, "{}@{}", self.path, file),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Split `class::name` into its trimmed halves.
///
/// `Ok(None)` when there is no `::` at all; an error when there is more
/// than one.
pub fn split_identifier(id: &str) -> CfgResult<Option<(&str, &str)>> {
    let mut parts = id.split("::");
    let class = parts.next().unwrap_or_default().trim();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    if parts.next().is_some() {
        return Err(CfgError::malformed_identifier(id));
    }
    Ok(Some((class, name.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_same_file() {
        let r = Reference::parse(Path::new("a.cfg"), "q::mmm/field1")
            .unwrap()
            .unwrap();
        assert_eq!(r.path(), "q::mmm/field1");
        assert_eq!(r.section_id(), "q::mmm");
        assert_eq!(r.sibling(), None);
        assert_eq!(r.origin(), Path::new("a.cfg"));
    }

    #[test]
    fn test_reference_cross_file() {
        let r = Reference::parse(
            Path::new("conf/a.cfg"),
            "dataset :: articles/layout/vocab_size@articles",
        )
        .unwrap()
        .unwrap();
        assert_eq!(r.path(), "dataset::articles/layout/vocab_size");
        assert_eq!(r.sibling(), Some("articles"));
        assert_eq!(r.to_string(), "dataset::articles/layout/vocab_size@articles");
    }

    #[test]
    fn test_reference_requires_class_prefix() {
        assert!(Reference::parse(Path::new("a.cfg"), "ha ho").unwrap().is_none());
        assert!(Reference::parse(Path::new("a.cfg"), "user@host").unwrap().is_none());
        assert!(Reference::parse(Path::new("a.cfg"), "me@").unwrap().is_none());
        assert!(Reference::parse(Path::new("a.cfg"), "@").unwrap().is_none());
    }

    #[test]
    fn test_reference_rejects_empty_file() {
        let err = Reference::parse(Path::new("a.cfg"), "b::1/x@ ").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MalformedIdentifier);
    }

    #[test]
    fn test_reference_rejects_double_separator() {
        let err = Reference::parse(Path::new("a.cfg"), "a::b::c").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MalformedIdentifier);
    }

    #[test]
    fn test_value_equality_and_accessors() {
        assert_eq!(Value::from(vec![1i64, 2]), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_display_is_literal_like() {
        let mut map = Map::new();
        map.insert("k".into(), Value::from(vec![Value::Null, Value::Float(1.5)]));
        assert_eq!(Value::Map(map).to_string(), "{k: [None, 1.5]}");
    }
}
