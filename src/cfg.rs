//! Configuration files and the graph of files reachable from one root.
//!
//! Loading a file only runs the raw reader. The section table (every
//! section of the file, with parsed field values) is built on first access,
//! and fields are resolved on first use. Sibling files named by `@file`
//! references are loaded on demand into a cache shared by the root and all
//! of its siblings, so each file is read and parsed at most once.

use crate::error::{CfgError, CfgResult, ErrorCode};
use crate::enums::EnumRegistry;
use crate::ini::{self, RawIni};
use crate::options::CfgOptions;
use crate::parser::ParseContext;
use crate::resolve::Resolver;
use crate::section::Section;
use crate::value::{Value, split_identifier};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace};

/// Extension used for siblings when the current file has none.
pub const DEFAULT_EXTENSION: &str = "cfg";

/// Pseudo file name given to configurations parsed from a string.
const INLINE_FILE: &str = "<inline>.cfg";

/// Section table of one file, keyed by `class::name`.
pub(crate) type SectionTable = IndexMap<String, Rc<Section>>;

/// Every file loaded on behalf of one root configuration.
pub(crate) struct FileGraph {
    pub(crate) options: CfgOptions,
    files: RefCell<HashMap<PathBuf, Rc<CfgFile>>>,
    parses: Cell<usize>,
}

impl FileGraph {
    fn new(options: CfgOptions) -> Self {
        Self {
            options,
            files: RefCell::new(HashMap::new()),
            parses: Cell::new(0),
        }
    }

    /// A file already in the graph.
    pub(crate) fn file(&self, path: &Path) -> Option<Rc<CfgFile>> {
        self.files.borrow().get(path).cloned()
    }

    /// Read, raw-parse and register the file at `path` (already resolved).
    fn open(&self, path: &Path) -> CfgResult<Rc<CfgFile>> {
        if let Some(file) = self.file(path) {
            return Ok(file);
        }
        let provider = &self.options.provider;
        if !provider.exists(path) {
            return Err(CfgError::file_not_found(path));
        }
        let text = provider.read(path)?;
        self.register(path, &text)
    }

    fn register(&self, path: &Path, text: &str) -> CfgResult<Rc<CfgFile>> {
        let raw = ini::parse(text).map_err(|e| CfgError::from(e).with_file(path))?;
        self.parses.set(self.parses.get() + 1);
        debug!(file = %path.display(), sections = raw.len(), "loaded cfg file");

        let file = Rc::new(CfgFile {
            path: path.to_path_buf(),
            raw,
            table: OnceCell::new(),
        });
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&file));
        Ok(file)
    }

    /// The sibling `name` of `origin`: `<origin dir>/<name>.<origin ext>`.
    ///
    /// A name that resolves back to `origin` yields `origin` itself.
    pub(crate) fn sibling(&self, origin: &Rc<CfgFile>, name: &str) -> CfgResult<Rc<CfgFile>> {
        let ext = origin
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_EXTENSION);
        let dir = origin.path.parent().unwrap_or_else(|| Path::new(""));
        let path = self
            .options
            .provider
            .resolve(&dir.join(format!("{}.{}", name, ext)));

        if path == origin.path {
            trace!(file = %path.display(), "sibling reference to own file");
            return Ok(Rc::clone(origin));
        }
        if let Some(file) = self.file(&path) {
            trace!(file = %path.display(), "sibling cache hit");
            return Ok(file);
        }
        debug!(
            from = %origin.path.display(),
            sibling = %path.display(),
            "loading sibling cfg file"
        );
        self.open(&path)
    }
}

/// One loaded file.
pub(crate) struct CfgFile {
    pub(crate) path: PathBuf,
    raw: RawIni,
    table: OnceCell<SectionTable>,
}

impl CfgFile {
    /// Section table, built on first call.
    pub(crate) fn table(&self, graph: &Rc<FileGraph>) -> CfgResult<&SectionTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = self.build_table(graph)?;
        Ok(self.table.get_or_init(|| table))
    }

    fn build_table(&self, graph: &Rc<FileGraph>) -> CfgResult<SectionTable> {
        let mut table = SectionTable::with_capacity(self.raw.len());
        let mut headers = HashMap::with_capacity(self.raw.len());

        for (header, fields) in &self.raw {
            let section =
                Section::from_header(header, &self.path, fields.clone(), Rc::downgrade(graph))?;
            let id = section.id().to_string();
            if table.contains_key(&id) {
                return Err(CfgError::new(
                    ErrorCode::ParseError,
                    format!("section {} is declared more than once", id),
                )
                .with_section(id)
                .with_file(&self.path));
            }
            headers.insert(header.clone(), id.clone());
            table.insert(id, Rc::new(section));
        }

        let symbols = Symbols {
            origin: &self.path,
            table: &table,
            headers: &headers,
            enums: &graph.options.enums,
        };
        for section in table.values() {
            section.parse_fields(&symbols)?;
        }

        debug!(file = %self.path.display(), sections = table.len(), "built section table");
        Ok(table)
    }

    /// Look up `class::name`.
    pub(crate) fn section(&self, graph: &Rc<FileGraph>, id: &str) -> CfgResult<Rc<Section>> {
        let (class, name) = split_identifier(id)
            .map_err(|e| e.with_file(&self.path))?
            .ok_or_else(|| CfgError::malformed_identifier(id).with_file(&self.path))?;
        self.table(graph)?
            .get(&format!("{}::{}", class, name))
            .cloned()
            .ok_or_else(|| CfgError::unknown_section(id).with_file(&self.path))
    }
}

/// Names visible to the value parser while a table is being built.
struct Symbols<'a> {
    origin: &'a Path,
    table: &'a SectionTable,
    headers: &'a HashMap<String, String>,
    enums: &'a EnumRegistry,
}

impl ParseContext for Symbols<'_> {
    fn section(&self, token: &str) -> Option<Rc<Section>> {
        if let Some(id) = self.headers.get(token) {
            return self.table.get(id).cloned();
        }
        if token.contains(['/', '@', '(']) {
            return None;
        }
        let (class, name) = split_identifier(token).ok().flatten()?;
        self.table.get(&format!("{}::{}", class, name)).cloned()
    }

    fn origin(&self) -> &Path {
        self.origin
    }

    fn enums(&self) -> &EnumRegistry {
        self.enums
    }
}

/// Handle to a loaded configuration file.
///
/// Cloning is cheap; clones share the file graph and every cache.
#[derive(Clone)]
pub struct Cfg {
    graph: Rc<FileGraph>,
    file: Rc<CfgFile>,
}

impl Cfg {
    /// Load a file from disk with default options.
    pub fn load<P: AsRef<Path>>(path: P) -> CfgResult<Self> {
        Self::load_with(path, CfgOptions::default())
    }

    /// Load a file through the provider in `options`.
    pub fn load_with<P: AsRef<Path>>(path: P, options: CfgOptions) -> CfgResult<Self> {
        let graph = Rc::new(FileGraph::new(options));
        let path = graph.options.provider.resolve(path.as_ref());
        let file = graph.open(&path)?;
        Ok(Self { graph, file })
    }

    /// Parse configuration text. Sibling references are looked up in the
    /// current directory.
    pub fn from_text(text: &str) -> CfgResult<Self> {
        Self::from_text_with(text, CfgOptions::default())
    }

    pub fn from_text_with(text: &str, options: CfgOptions) -> CfgResult<Self> {
        let graph = Rc::new(FileGraph::new(options));
        let path = graph.options.provider.resolve(Path::new(INLINE_FILE));
        let file = graph.register(&path, text)?;
        Ok(Self { graph, file })
    }

    /// Resolved path of this file.
    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// Directory siblings are looked up in.
    pub fn dir(&self) -> &Path {
        self.file.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Section `class::name` of this file.
    pub fn section(&self, id: &str) -> CfgResult<Rc<Section>> {
        self.file.section(&self.graph, id)
    }

    /// All sections in declaration order.
    pub fn sections(&self) -> CfgResult<Vec<Rc<Section>>> {
        Ok(self.file.table(&self.graph)?.values().cloned().collect())
    }

    /// Identifiers of all sections in declaration order.
    pub fn section_ids(&self) -> CfgResult<Vec<String>> {
        Ok(self.file.table(&self.graph)?.keys().cloned().collect())
    }

    /// Resolved value at `class::name[/field...]`.
    ///
    /// ```
    /// use supercfg::{Cfg, Value};
    ///
    /// let cfg = Cfg::from_text("[b::1]\nsay = c::x/who\n[c::x]\nwho = 'me'").unwrap();
    /// assert_eq!(cfg.get("b::1/say").unwrap(), Value::from("me"));
    /// ```
    pub fn get(&self, path: &str) -> CfgResult<Value> {
        let mut resolver = Resolver::new(&self.graph);
        let value = resolver.lookup(&self.file, path)?;
        resolver.resolve_value(value)
    }

    /// Convert section `id` into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self, id: &str) -> CfgResult<T> {
        self.section(id)?.deserialize()
    }

    /// Resolve every section of this file, failing on the first error.
    pub fn resolve_all(&self) -> CfgResult<()> {
        for section in self.sections()? {
            section.fields()?;
        }
        Ok(())
    }

    /// Number of files read and parsed so far, this one included.
    pub fn parsed_files(&self) -> usize {
        self.graph.parses.get()
    }
}

impl fmt::Debug for Cfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cfg")
            .field("path", &self.file.path)
            .field("parsed_files", &self.parsed_files())
            .finish()
    }
}
