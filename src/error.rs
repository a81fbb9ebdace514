//! Structured error types for configuration loading and resolution.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    FileNotFound,
    UnknownSection,
    UnknownField,
    IllegalPath,

    // Grammar errors
    MalformedIdentifier,
    ParseError,
    InvalidLiteral,
    UnknownEnum,

    // Graph errors
    UnresolvableReference,
    CyclicReference,

    // Environment errors
    Io,
    Detached,

    // Typed access
    Deserialize,
}

/// Structured error with the context known at the point of detection.
#[derive(Debug, Clone, Serialize)]
pub struct CfgError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl CfgError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key: None,
            section: None,
            file: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Attach a section id unless a more specific one was already recorded.
    pub fn or_section(mut self, section: impl Into<String>) -> Self {
        if self.section.is_none() {
            self.section = Some(section.into());
        }
        self
    }

    /// Attach a key unless a more specific one was already recorded.
    pub fn or_key(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() {
            self.key = Some(key.into());
        }
        self
    }

    /// Attach a file unless a more specific one was already recorded.
    pub fn or_file(mut self, file: impl AsRef<Path>) -> Self {
        if self.file.is_none() {
            self.file = Some(file.as_ref().to_path_buf());
        }
        self
    }

    // Convenience constructors

    pub fn file_not_found(path: &Path) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("no such cfg file: {}", path.display()),
        )
        .with_file(path)
    }

    pub fn unknown_section(id: &str) -> Self {
        Self::new(ErrorCode::UnknownSection, format!("no such section: {}", id)).with_section(id)
    }

    pub fn unknown_field(field: &str, section: &str) -> Self {
        Self::new(
            ErrorCode::UnknownField,
            format!("no such option: {}, in: {}", field, section),
        )
        .with_key(field)
        .with_section(section)
    }

    pub fn illegal_path(path: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::IllegalPath,
            format!("illegal path: {} ({})", path, reason),
        )
        .with_key(path)
    }

    pub fn malformed_identifier(id: &str) -> Self {
        Self::new(
            ErrorCode::MalformedIdentifier,
            format!("illegal identifier: {} (expected exactly one '::')", id),
        )
    }

    pub fn invalid_literal(token: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidLiteral,
            format!("invalid literal {}: {}", token, reason),
        )
    }

    pub fn unknown_enum(path: &str, reason: &str) -> Self {
        Self::new(ErrorCode::UnknownEnum, format!("enum:{}: {}", path, reason))
    }

    pub fn unresolvable(reference: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::UnresolvableReference,
            format!("cannot resolve {}: {}", reference, reason),
        )
    }

    pub fn cyclic(chain: &[String]) -> Self {
        Self::new(
            ErrorCode::CyclicReference,
            format!("reference cycle: {}", chain.join(" -> ")),
        )
    }

    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Io,
            format!("cannot read {}: {}", path.display(), err),
        )
        .with_file(path)
    }

    pub fn deserialize(section: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Deserialize,
            format!("cannot convert {}: {}", section, err),
        )
        .with_section(section)
    }

    pub fn detached(section: &str) -> Self {
        Self::new(
            ErrorCode::Detached,
            format!("section {} outlived its configuration", section),
        )
        .with_section(section)
    }
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref key) = self.key {
            write!(f, " [key: {}]", key)?;
        }
        if let Some(ref section) = self.section {
            write!(f, " [section: {}]", section)?;
        }
        if let Some(ref file) = self.file {
            write!(f, " [file: {}]", file.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for CfgError {}

/// Result type for configuration operations.
pub type CfgResult<T> = std::result::Result<T, CfgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = CfgError::unknown_field("depth", "model::small").with_file("conf/a.cfg");
        let text = err.to_string();
        assert!(text.contains("no such option: depth"));
        assert!(text.contains("[section: model::small]"));
        assert!(text.contains("[file: conf/a.cfg]"));
    }

    #[test]
    fn test_or_section_keeps_inner_context() {
        let err = CfgError::unknown_section("b::1").or_section("a::1");
        assert_eq!(err.section.as_deref(), Some("b::1"));

        let err = CfgError::invalid_literal("[1", "unbalanced").or_section("a::1");
        assert_eq!(err.section.as_deref(), Some("a::1"));
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let err = CfgError::cyclic(&["a::1".into(), "a::1".into()]);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CYCLIC_REFERENCE");
        assert!(json.get("key").is_none());
    }
}
