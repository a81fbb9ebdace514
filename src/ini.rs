//! Raw section reader.
//!
//! Splits INI text into an ordered map of section headers, each holding an
//! ordered map of keys to raw, whitespace-trimmed value text. Nothing here
//! interprets values; that is the job of [`crate::parser`].

use crate::error::{CfgError, ErrorCode};
use indexmap::IndexMap;
use thiserror::Error;

/// Raw fields of one section, in declaration order.
pub type RawSection = IndexMap<String, String>;

/// Raw sections of one file, in declaration order.
pub type RawIni = IndexMap<String, RawSection>;

/// Reasons the raw reader rejects a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IniError {
    #[error("line {line}: option '{key}' appears before any section header")]
    MissingSectionHeader { line: usize, key: String },

    #[error("line {line}: section [{name}] already defined")]
    DuplicateSection { line: usize, name: String },

    #[error("line {line}: option '{key}' already defined in section [{section}]")]
    DuplicateOption {
        line: usize,
        section: String,
        key: String,
    },

    #[error("line {line}: unterminated section header '{text}'")]
    UnterminatedHeader { line: usize, text: String },

    #[error("line {line}: expected 'key = value', found '{text}'")]
    MalformedLine { line: usize, text: String },
}

impl From<IniError> for CfgError {
    fn from(err: IniError) -> Self {
        CfgError::new(ErrorCode::ParseError, err.to_string())
    }
}

/// Parse INI text into raw sections.
///
/// Comment lines start with `#` or `;`. Options are `key = value` or
/// `key: value`, split at whichever delimiter comes first.
pub fn parse(text: &str) -> Result<RawIni, IniError> {
    let mut sections = RawIni::new();
    let mut current: Option<String> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let Some(header) = header.strip_suffix(']') else {
                return Err(IniError::UnterminatedHeader {
                    line: line_no,
                    text: line.to_string(),
                });
            };
            let header = header.trim().to_string();
            if sections.contains_key(&header) {
                return Err(IniError::DuplicateSection {
                    line: line_no,
                    name: header,
                });
            }
            sections.insert(header.clone(), RawSection::new());
            current = Some(header);
            continue;
        }

        let Some(split) = line.find(['=', ':']) else {
            return Err(IniError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            });
        };
        let key = line[..split].trim();
        let value = line[split + 1..].trim();
        if key.is_empty() {
            return Err(IniError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            });
        }

        let Some(ref section) = current else {
            return Err(IniError::MissingSectionHeader {
                line: line_no,
                key: key.to_string(),
            });
        };
        let fields = sections.entry(section.clone()).or_default();
        if fields.contains_key(key) {
            return Err(IniError::DuplicateOption {
                line: line_no,
                section: section.clone(),
                key: key.to_string(),
            });
        }
        fields.insert(key.to_string(), value.to_string());
    }

    Ok(sections)
}
