//! Output formatting utilities for text and JSON.

use crate::error::CfgResult;
use crate::section::Section;
use crate::value::Value;
use std::rc::Rc;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "text" | "markdown" | "md" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

/// Render one resolved value.
pub fn format_value(value: &Value, format: OutputFormat) -> CfgResult<String> {
    match format {
        OutputFormat::Json => Ok(pretty(&value.to_json()?)),
        OutputFormat::Text => match value {
            Value::Section(section) => format_section_markdown(section),
            other => Ok(other.to_string()),
        },
    }
}

/// Format a resolved section as markdown.
pub fn format_section_markdown(section: &Section) -> CfgResult<String> {
    let mut md = String::new();

    md.push_str(&format!("## {}\n", section.id()));
    if let Some(parent) = section.parent() {
        md.push_str(&format!("- **parent**: `{}`\n", parent));
    }
    for (key, value) in section.fields()? {
        md.push_str(&format!("- **{}**: {}\n", key, value));
    }

    Ok(md)
}

/// Format every section of a file, in declaration order.
pub fn format_sections(sections: &[Rc<Section>], format: OutputFormat) -> CfgResult<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::Map::new();
            for section in sections {
                out.insert(section.id().to_string(), section.to_json()?);
            }
            Ok(pretty(&serde_json::Value::Object(out)))
        }
        OutputFormat::Text => {
            let mut md = String::new();
            for section in sections {
                md.push_str(&format_section_markdown(section)?);
                md.push('\n');
            }
            Ok(md)
        }
    }
}

/// One line per section: id, then parent if any.
pub fn format_section_list(sections: &[Rc<Section>]) -> String {
    sections
        .iter()
        .map(|s| match s.parent() {
            Some(parent) => format!("{} ({})\n", s.id(), parent),
            None => format!("{}\n", s.id()),
        })
        .collect()
}

fn pretty(json: &serde_json::Value) -> String {
    serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string())
}
