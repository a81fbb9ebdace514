//! One configuration block: `[class::name]` or `[class::name(parent)]`.
//!
//! A section keeps its raw text, the values parsed from it, and the
//! memoized results of inheritance merge and reference resolution. The
//! resolution itself lives in [`crate::resolve`].

use crate::cfg::FileGraph;
use crate::error::{CfgError, CfgResult};
use crate::ini::RawSection;
use crate::parser::{ParseContext, parse_item};
use crate::resolve::Resolver;
use crate::value::{Map, Reference, Value, split_identifier};
use serde::de::DeserializeOwned;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// A configuration section.
pub struct Section {
    class: String,
    name: String,
    id: String,
    file: PathBuf,
    parent: Option<Reference>,
    raw: RawSection,
    graph: Weak<FileGraph>,

    /// Own fields as parsed; may hold unresolved references.
    pub(crate) fields: OnceCell<Map>,
    /// Parent's resolved fields overlaid with own fields.
    pub(crate) merged: OnceCell<Map>,
    /// Fields resolved so far.
    pub(crate) resolved: RefCell<Map>,
    /// Every field resolved, in merged order.
    pub(crate) all_fields: OnceCell<Map>,
}

impl Section {
    /// Build an unparsed section from its header and raw fields.
    pub(crate) fn from_header(
        header: &str,
        file: &Path,
        raw: RawSection,
        graph: Weak<FileGraph>,
    ) -> CfgResult<Self> {
        let (class, name, parent) =
            parse_header(header, file).map_err(|e| e.with_section(header).with_file(file))?;
        Ok(Self {
            id: format!("{}::{}", class, name),
            class,
            name,
            file: file.to_path_buf(),
            parent,
            raw,
            graph,
            fields: OnceCell::new(),
            merged: OnceCell::new(),
            resolved: RefCell::new(Map::new()),
            all_fields: OnceCell::new(),
        })
    }

    /// Parse every raw field. Runs once, when the file's table is built.
    pub(crate) fn parse_fields(&self, ctx: &dyn ParseContext) -> CfgResult<()> {
        if self.fields.get().is_some() {
            return Ok(());
        }
        let mut fields = Map::with_capacity(self.raw.len());
        for (key, raw) in &self.raw {
            let value = parse_item(raw, ctx).map_err(|e| {
                e.or_key(key.as_str())
                    .or_section(self.id.as_str())
                    .or_file(&self.file)
            })?;
            fields.insert(key.clone(), value);
        }
        let _ = self.fields.set(fields);
        Ok(())
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `class::name`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// File the section was declared in.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Parent reference from the header, if any.
    pub fn parent(&self) -> Option<&Reference> {
        self.parent.as_ref()
    }

    /// Field text exactly as written.
    pub fn raw_fields(&self) -> &RawSection {
        &self.raw
    }

    /// Whether the resolved field map has been computed.
    pub fn is_resolved(&self) -> bool {
        self.all_fields.get().is_some()
    }

    fn graph(&self) -> CfgResult<Rc<FileGraph>> {
        self.graph
            .upgrade()
            .ok_or_else(|| CfgError::detached(&self.id))
    }

    /// Resolved field map: inherited, dereferenced and substituted.
    pub fn fields(&self) -> CfgResult<&Map> {
        let graph = self.graph()?;
        Resolver::new(&graph).all_fields(self)
    }

    /// Value at a slash-delimited path below this section, e.g. `model/depth`.
    pub fn get(&self, path: &str) -> CfgResult<Value> {
        let graph = self.graph()?;
        let mut resolver = Resolver::new(&graph);
        let mut segments = path.split('/');
        let head = segments.next().unwrap_or_default();
        let value = resolver
            .field(self, head)?
            .ok_or_else(|| CfgError::unknown_field(head, &self.id).with_file(&self.file))?;
        let rest: Vec<&str> = segments.collect();
        resolver.navigate(value, &format!("{}/{}", self.id, head), &rest)
    }

    /// Value of `key`, or `default` when the section has no such field.
    ///
    /// A field that is present but `None` yields `Value::Null`, not the
    /// default.
    pub fn get_or(&self, key: &str, default: Value) -> CfgResult<Value> {
        Ok(self.fields()?.get(key).cloned().unwrap_or(default))
    }

    pub fn contains(&self, key: &str) -> CfgResult<bool> {
        Ok(self.fields()?.contains_key(key))
    }

    /// Resolved fields as a JSON object.
    pub fn to_json(&self) -> CfgResult<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (key, value) in self.fields()? {
            out.insert(key.clone(), value.to_json()?);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Convert the resolved fields into a typed struct.
    ///
    /// ```
    /// use serde::Deserialize;
    /// use supercfg::Cfg;
    ///
    /// #[derive(Deserialize)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let cfg = Cfg::from_text("[server::main]\nhost = 'localhost'\nport = 8080").unwrap();
    /// let server: Server = cfg.section("server::main").unwrap().deserialize().unwrap();
    /// assert_eq!(server.port, 8080);
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> CfgResult<T> {
        serde_json::from_value(self.to_json()?).map_err(|e| {
            CfgError::deserialize(&self.id, e).with_file(&self.file)
        })
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("file", &self.file)
            .field("parent", &self.parent.as_ref().map(ToString::to_string))
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Split a header into class, name and optional parent reference.
///
/// A bare parent name is taken from the same class.
fn parse_header(header: &str, file: &Path) -> CfgResult<(String, String, Option<Reference>)> {
    let (ident, parent) = match header.strip_suffix(')').and_then(|h| h.split_once('(')) {
        Some((ident, parent)) => (ident.trim(), Some(parent.trim())),
        None => (header.trim(), None),
    };

    let (class, name) = split_identifier(ident)?
        .filter(|(class, name)| !class.is_empty() && !name.is_empty())
        .ok_or_else(|| CfgError::malformed_identifier(header))?;

    let parent = match parent {
        None => None,
        Some("") => return Err(CfgError::malformed_identifier(header)),
        Some(parent) => {
            let qualified = if parent.contains("::") {
                parent.to_string()
            } else {
                format!("{}::{}", class, parent)
            };
            Some(
                Reference::parse(file, &qualified)?
                    .ok_or_else(|| CfgError::malformed_identifier(header))?,
            )
        }
    };

    Ok((class.to_string(), name.to_string(), parent))
}
