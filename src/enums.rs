//! Registry of enumerations addressable from `enum:<Type>.<Member>` literals.
//!
//! The embedding application registers its enumerations before parsing. A
//! registry can also be read from YAML, mapping type paths to member lists:
//!
//! ```yaml
//! app.Color: [RED, GREEN, BLUE]
//! app.net.Mode: [ACTIVE, PASSIVE]
//! ```

use crate::error::{CfgError, CfgResult, ErrorCode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A named enumeration and its ordered members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<String>,
}

/// A resolved enum member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumValue {
    /// Registered type path, e.g. `app.Color`.
    pub type_path: String,
    pub member: String,
    /// Position of the member in its definition.
    pub ordinal: usize,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_path, self.member)
    }
}

/// Mapping from type paths to enumeration definitions.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    types: IndexMap<String, EnumDef>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an enumeration under `type_path`.
    pub fn register<I, S>(&mut self, type_path: &str, members: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = type_path
            .rsplit('.')
            .next()
            .unwrap_or(type_path)
            .to_string();
        let members = members.into_iter().map(Into::into).collect();
        self.types
            .insert(type_path.to_string(), EnumDef { name, members });
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<I, S>(mut self, type_path: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(type_path, members);
        self
    }

    pub fn get(&self, type_path: &str) -> Option<&EnumDef> {
        self.types.get(type_path)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a `<Type>.<Member>` expression.
    pub fn resolve(&self, expr: &str) -> CfgResult<EnumValue> {
        let Some((type_path, member)) = expr.rsplit_once('.') else {
            return Err(CfgError::invalid_literal(
                &format!("enum:{}", expr),
                "expected <Type>.<Member>",
            ));
        };
        let def = self
            .types
            .get(type_path)
            .ok_or_else(|| CfgError::unknown_enum(expr, "type is not registered"))?;
        let ordinal = def
            .members
            .iter()
            .position(|m| m == member)
            .ok_or_else(|| {
                CfgError::unknown_enum(expr, &format!("{} has no member {}", def.name, member))
            })?;
        Ok(EnumValue {
            type_path: type_path.to_string(),
            member: member.to_string(),
            ordinal,
        })
    }

    /// Parse a YAML registry document.
    pub fn from_yaml(content: &str) -> CfgResult<Self> {
        let types: IndexMap<String, Vec<String>> = serde_yaml::from_str(content).map_err(|e| {
            CfgError::new(ErrorCode::ParseError, format!("invalid enum registry: {}", e))
        })?;
        let mut registry = Self::new();
        for (type_path, members) in types {
            registry.register(&type_path, members);
        }
        Ok(registry)
    }

    /// Load a YAML registry file.
    pub fn load<P: AsRef<Path>>(path: P) -> CfgResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CfgError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path).map_err(|e| CfgError::io(path, e))?;
        Self::from_yaml(&content).map_err(|e| e.with_file(path))
    }

    /// Layer `overlay` on top of this registry; its types replace ours.
    pub fn merge(&mut self, overlay: EnumRegistry) {
        for (type_path, def) in overlay.types {
            self.types.insert(type_path, def);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> EnumRegistry {
        EnumRegistry::new().with("app.Color", ["RED", "GREEN", "BLUE"])
    }

    #[test]
    fn test_resolve_member() {
        let value = colors().resolve("app.Color.GREEN").unwrap();
        assert_eq!(value.type_path, "app.Color");
        assert_eq!(value.member, "GREEN");
        assert_eq!(value.ordinal, 1);
        assert_eq!(value.to_string(), "app.Color.GREEN");
    }

    #[test]
    fn test_unknown_type_and_member() {
        let registry = colors();
        assert_eq!(
            registry.resolve("app.Shape.CIRCLE").unwrap_err().code,
            ErrorCode::UnknownEnum
        );
        assert_eq!(
            registry.resolve("app.Color.PINK").unwrap_err().code,
            ErrorCode::UnknownEnum
        );
        assert_eq!(
            registry.resolve("Color").unwrap_err().code,
            ErrorCode::InvalidLiteral
        );
    }

    #[test]
    fn test_from_yaml_and_merge() {
        let mut base = EnumRegistry::from_yaml("app.Color: [RED]\napp.Mode: [ON, OFF]").unwrap();
        let overlay = EnumRegistry::from_yaml("app.Color: [CYAN, MAGENTA]").unwrap();
        base.merge(overlay);

        assert_eq!(base.len(), 2);
        assert_eq!(base.get("app.Color").unwrap().members, vec!["CYAN", "MAGENTA"]);
        assert_eq!(base.get("app.Mode").unwrap().name, "Mode");
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        let err = EnumRegistry::from_yaml("- just\n- a list").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }
}
