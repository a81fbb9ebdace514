//! `$(NAME)` placeholder substitution in resolved string values.
//!
//! Builtins:
//! - `$(TIMESTAMP)`: local time as `YYYYMMDD_HHMMSS`
//! - `$(UUID)`: a fresh random UUID for every occurrence
//!
//! Unknown names are left as they are. A caller-supplied lookup replaces the
//! builtin table entirely.

use crate::value::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// Caller lookup: placeholder name to replacement, `None` to leave it.
pub type Lookup = Rc<dyn Fn(&str) -> Option<String>>;

/// Value of a builtin placeholder.
pub fn builtin(name: &str) -> Option<String> {
    match name {
        "TIMESTAMP" => Some(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()),
        "UUID" => Some(uuid::Uuid::new_v4().to_string()),
        _ => None,
    }
}

/// Rewrites `$(NAME)` placeholders.
#[derive(Clone, Default)]
pub struct TemplateSubstitutor {
    lookup: Option<Lookup>,
}

impl TemplateSubstitutor {
    /// Substitutor using the builtin table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitutor using `lookup` instead of the builtins.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            lookup: Some(Rc::new(lookup)),
        }
    }

    fn replacement(&self, name: &str) -> Option<String> {
        match self.lookup {
            Some(ref lookup) => lookup(name),
            None => builtin(name),
        }
    }

    /// Replace every `$(NAME)` in `input`.
    pub fn substitute(&self, input: &str) -> String {
        if !input.contains("$(") {
            return input.to_string();
        }

        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == '$' && chars.peek() == Some(&'(') {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ')' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                let replacement = if closed && !name.is_empty() {
                    self.replacement(&name)
                } else {
                    None
                };
                match replacement {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("$(");
                        result.push_str(&name);
                        if closed {
                            result.push(')');
                        }
                    }
                }
            } else {
                result.push(ch);
            }
        }

        result
    }

    /// Substitute inside strings, descending into lists and maps.
    ///
    /// References and nested sections are left alone; their targets
    /// substitute their own fields.
    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.substitute(&s)),
            Value::List(items) => Value::List(items.into_iter().map(|v| self.apply(v)).collect()),
            Value::Map(map) => Value::Map(self.apply_map(map)),
            other => other,
        }
    }

    /// [`apply`](Self::apply) over every entry of `map`.
    pub fn apply_map(&self, map: Map) -> Map {
        map.into_iter().map(|(k, v)| (k, self.apply(v))).collect()
    }
}

impl fmt::Debug for TemplateSubstitutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSubstitutor")
            .field("custom_lookup", &self.lookup.is_some())
            .finish()
    }
}
