//! Literal grammar for raw field text.
//!
//! [`parse_item`] turns one raw token into a [`Value`]. Recognition order is
//! fixed and first match wins:
//!
//! 1. name of an existing section of the same file (nested section)
//! 2. quoted string, `'...'` or `"..."`
//! 3. `pattern:<regex>`
//! 4. `enum:<Type>.<Member>`
//! 5. `None` / `none` / `NONE`
//! 6. integer (`-1_000`)
//! 7. integer in exponent form (`1e3`, `2e+4`), truncated
//! 8. float (`1.`, `-31.e-3`) or negative exponent form (`1e-3`)
//! 9. `true` / `false`, any case
//! 10. list `[a, b, ...]`
//! 11. map `{k: v, ...}` or `{k => v, ...}`
//! 12. reference `class::name[/path][@file]`, otherwise plain string
//!
//! The numeric rules overlap; their order is part of the grammar and must
//! not be rearranged.

use crate::enums::EnumRegistry;
use crate::error::{CfgError, CfgResult};
use crate::section::Section;
use crate::value::{Map, Reference, Value};
use regex_lite::Regex;
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

static INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9_]+$").expect("valid int pattern"));
static INT_EXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9_]+e\+?[0-9_]+$").expect("valid int exp pattern"));
static FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?[0-9_]*\.[0-9_]*(e[+-]?[0-9_]+)?$").expect("valid float pattern")
});
static FLOAT_NEG_EXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9_]+e-[0-9_]+$").expect("valid float exp pattern"));

/// What the parser needs to know about its surroundings.
pub trait ParseContext {
    /// The section named by `token`, if the token is exactly a section
    /// identifier (or raw header) of the current file.
    fn section(&self, token: &str) -> Option<Rc<Section>>;

    /// File the token was read from; references remember it.
    fn origin(&self) -> &Path;

    fn enums(&self) -> &EnumRegistry;
}

/// Parse one raw token.
pub fn parse_item(raw: &str, ctx: &dyn ParseContext) -> CfgResult<Value> {
    let token = raw.trim();

    if let Some(section) = ctx.section(token) {
        return Ok(Value::Section(section));
    }
    if let Some(inner) = quoted(token) {
        return Ok(Value::String(unescape(inner)));
    }
    if let Some(source) = token.strip_prefix("pattern:") {
        return Regex::new(source)
            .map(Value::Pattern)
            .map_err(|e| CfgError::invalid_literal(token, e));
    }
    if let Some(expr) = token.strip_prefix("enum:") {
        return ctx.enums().resolve(expr.trim()).map(Value::Enum);
    }
    if matches!(token, "None" | "none" | "NONE") {
        return Ok(Value::Null);
    }
    if numeric(&INT, token) {
        return digits(token)
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| CfgError::invalid_literal(token, e));
    }
    if numeric(&INT_EXP, token) {
        return digits(token)
            .parse::<f64>()
            .map(|f| Value::Int(f as i64))
            .map_err(|e| CfgError::invalid_literal(token, e));
    }
    if numeric(&FLOAT, token) || numeric(&FLOAT_NEG_EXP, token) {
        return digits(token)
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| CfgError::invalid_literal(token, e));
    }
    if token.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }
    if let Some(body) = enclosed(token, '[', ']') {
        return split_top_level(body)
            .iter()
            .map(|item| parse_item(item, ctx))
            .collect::<CfgResult<Vec<_>>>()
            .map(Value::List);
    }
    if let Some(body) = enclosed(token, '{', '}') {
        return parse_map(token, body, ctx).map(Value::Map);
    }
    if let Some(reference) = Reference::parse(ctx.origin(), token)? {
        return Ok(Value::Ref(reference));
    }
    Ok(Value::String(unescape(token)))
}

fn numeric(pattern: &Regex, token: &str) -> bool {
    pattern.is_match(token) && token.bytes().any(|b| b.is_ascii_digit())
}

fn digits(token: &str) -> String {
    token.chars().filter(|c| *c != '_').collect()
}

fn parse_map(token: &str, body: &str, ctx: &dyn ParseContext) -> CfgResult<Map> {
    let mut map = Map::new();
    for entry in split_top_level(body) {
        let (key, value) = split_entry(&entry).ok_or_else(|| {
            CfgError::invalid_literal(token, format!("map entry '{}' has no key", entry))
        })?;
        map.insert(key, parse_item(value, ctx)?);
    }
    Ok(map)
}

/// Split a map entry at `:` or `=>`, whichever comes first after the key.
fn split_entry(entry: &str) -> Option<(String, &str)> {
    if let Some(quote) = entry.chars().next().filter(|c| is_quote(*c)) {
        let close = closing_quote(entry, quote)?;
        let key = unescape(&entry[1..close]);
        let rest = entry[close + 1..].trim_start();
        let value = rest
            .strip_prefix("=>")
            .or_else(|| rest.strip_prefix(':'))?;
        return Some((key, value));
    }

    let colon = entry.find(':');
    let arrow = entry.find("=>");
    let (at, width) = match (colon, arrow) {
        (Some(c), Some(a)) if a < c => (a, 2),
        (Some(c), _) => (c, 1),
        (None, Some(a)) => (a, 2),
        (None, None) => return None,
    };
    let key = entry[..at].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), &entry[at + width..]))
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Byte index of the first unescaped `quote` after the opening one.
fn closing_quote(text: &str, quote: char) -> Option<usize> {
    let mut chars = text.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(idx);
        }
    }
    None
}

/// Inner text of a token that is exactly one quoted string.
fn quoted(token: &str) -> Option<&str> {
    let quote = token.chars().next().filter(|c| is_quote(*c))?;
    let close = closing_quote(token, quote)?;
    (close == token.len() - 1).then(|| &token[1..close])
}

/// Remove backslash escapes in a single pass.
///
/// A backslash stands for the character after it; a trailing lone
/// backslash is kept.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(c);
        }
    }
    out
}

/// Stack of expected closing characters while scanning a literal.
#[derive(Debug, Default)]
struct Nesting {
    expected: Vec<char>,
    in_quotes: bool,
}

impl Nesting {
    fn feed(&mut self, c: char) {
        if self.in_quotes {
            if self.expected.last() == Some(&c) {
                self.expected.pop();
                self.in_quotes = false;
            }
            return;
        }
        match c {
            '[' => self.expected.push(']'),
            '{' => self.expected.push('}'),
            '\'' | '"' => {
                self.expected.push(c);
                self.in_quotes = true;
            }
            _ if self.expected.last() == Some(&c) => {
                self.expected.pop();
            }
            _ => {}
        }
    }

    fn is_top_level(&self) -> bool {
        self.expected.is_empty()
    }
}

/// Body of `token` when it is exactly one `open ... close` literal.
fn enclosed(token: &str, open: char, close: char) -> Option<&str> {
    if !token.starts_with(open) || !token.ends_with(close) {
        return None;
    }
    let mut nesting = Nesting::default();
    let mut chars = token.char_indices();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        nesting.feed(c);
        if nesting.is_top_level() {
            let end = token.len() - close.len_utf8();
            return (idx == end).then(|| &token[open.len_utf8()..end]);
        }
    }
    None
}

/// Split a list or map body at top-level commas.
///
/// Brackets, braces and quotes nest; a backslash carries the next character
/// through untouched. Items are trimmed. An empty body yields no items and
/// a trailing comma is ignored.
pub fn split_top_level(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(escaped) = chars.next() {
                current.push(escaped);
            }
            continue;
        }
        if c == ',' && nesting.is_top_level() {
            items.push(current.trim().to_string());
            current.clear();
            continue;
        }
        nesting.feed(c);
        current.push(c);
    }

    let last = current.trim();
    if !last.is_empty() || (!items.is_empty() && !body.trim_end().ends_with(',')) {
        items.push(last.to_string());
    }
    items
}
