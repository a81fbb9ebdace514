//! Reference resolution and inheritance merge.
//!
//! A section's resolved field map is built in three steps:
//!
//! 1. the parent (if any) is resolved and its field map becomes the base;
//! 2. own fields go through `$(NAME)` substitution and are merged over it
//!    with [`merge_fields`];
//! 3. each field is dereferenced.
//!
//! Inherited and referenced values arrive already substituted by the
//! section that declares them, so every string is substituted once.
//!
//! Fields resolve one at a time and are memoized on the section, so a
//! section may refer to its own fields. Every step in progress is recorded
//! on a trail of `(file, class::name[/field])` entries; meeting an entry
//! already on the trail is a [`CyclicReference`](crate::ErrorCode) error.

use crate::cfg::{CfgFile, FileGraph};
use crate::error::{CfgError, CfgResult};
use crate::section::Section;
use crate::value::{Map, Reference, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Merge `overlay` into `base`.
///
/// - maps present on both sides merge recursively, overlay keys winning
/// - anything else in the overlay replaces the base entry
/// - keys only in the base are kept
pub fn merge_fields(base: &mut Map, overlay: Map) {
    for (key, value) in overlay {
        if let Value::Map(incoming) = value {
            if let Some(Value::Map(existing)) = base.get_mut(&key) {
                merge_fields(existing, incoming);
                continue;
            }
            base.insert(key, Value::Map(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Walks references within one file graph.
pub(crate) struct Resolver<'g> {
    graph: &'g Rc<FileGraph>,
    trail: Vec<(PathBuf, String)>,
}

impl<'g> Resolver<'g> {
    pub(crate) fn new(graph: &'g Rc<FileGraph>) -> Self {
        Self {
            graph,
            trail: Vec::new(),
        }
    }

    fn enter(&mut self, file: &Path, key: String) -> CfgResult<()> {
        if let Some(start) = self
            .trail
            .iter()
            .position(|(f, k)| f == file && *k == key)
        {
            let mut chain: Vec<String> = self.trail[start..]
                .iter()
                .map(|(_, k)| k.clone())
                .collect();
            chain.push(key.clone());
            return Err(CfgError::cyclic(&chain).with_key(key).with_file(file));
        }
        self.trail.push((file.to_path_buf(), key));
        Ok(())
    }

    fn leave(&mut self) {
        self.trail.pop();
    }

    /// Resolved field map of `section`, computed once.
    pub(crate) fn all_fields<'s>(&mut self, section: &'s Section) -> CfgResult<&'s Map> {
        if let Some(all) = section.all_fields.get() {
            return Ok(all);
        }

        let keys: Vec<String> = self.merged(section)?.keys().cloned().collect();
        let mut all = Map::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.field(section, &key)? {
                all.insert(key, value);
            }
        }

        debug!(
            section = %section.id(),
            file = %section.file().display(),
            fields = all.len(),
            "resolved section"
        );
        Ok(section.all_fields.get_or_init(|| all))
    }

    /// One resolved field, `None` if the section has no such field.
    pub(crate) fn field(&mut self, section: &Section, key: &str) -> CfgResult<Option<Value>> {
        if let Some(all) = section.all_fields.get() {
            return Ok(all.get(key).cloned());
        }
        if let Some(value) = section.resolved.borrow().get(key) {
            return Ok(Some(value.clone()));
        }
        let Some(value) = self.merged(section)?.get(key).cloned() else {
            return Ok(None);
        };

        self.enter(section.file(), format!("{}/{}", section.id(), key))?;
        let resolved = self.resolve_value(value);
        self.leave();

        let value = resolved.map_err(|e| {
            e.or_key(key)
                .or_section(section.id())
                .or_file(section.file())
        })?;
        section
            .resolved
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Parent fields overlaid with own substituted fields, references
    /// still unresolved.
    fn merged<'s>(&mut self, section: &'s Section) -> CfgResult<&'s Map> {
        if let Some(merged) = section.merged.get() {
            return Ok(merged);
        }
        let own = section.fields.get().ok_or_else(|| {
            CfgError::unresolvable(section.id(), "section fields were never parsed")
                .with_file(section.file())
        })?;

        let mut base = match section.parent() {
            Some(parent) => {
                self.enter(section.file(), section.id().to_string())?;
                let base = self.inherited(parent);
                self.leave();
                base.map_err(|e| e.or_section(section.id()).or_file(section.file()))?
            }
            None => Map::new(),
        };
        let own = self.graph.options.substitutor.apply_map(own.clone());
        merge_fields(&mut base, own);

        Ok(section.merged.get_or_init(|| base))
    }

    /// Resolved fields of the section `parent` points to.
    fn inherited(&mut self, parent: &Reference) -> CfgResult<Map> {
        let file = self.target_file(parent)?;
        match self.lookup(&file, parent.path())? {
            Value::Section(section) => self.all_fields(&section).cloned(),
            other => Err(CfgError::unresolvable(
                &parent.to_string(),
                &format!("parent is a {}, not a section", other.kind()),
            )),
        }
    }

    /// Replace references at any depth and resolve nested sections.
    pub(crate) fn resolve_value(&mut self, value: Value) -> CfgResult<Value> {
        match value {
            Value::Ref(reference) => self.resolve_reference(&reference),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.resolve_value(item))
                .collect::<CfgResult<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key, self.resolve_value(item)?);
                }
                Ok(Value::Map(out))
            }
            Value::Section(section) => {
                self.all_fields(&section)?;
                Ok(Value::Section(section))
            }
            other => Ok(other),
        }
    }

    fn resolve_reference(&mut self, reference: &Reference) -> CfgResult<Value> {
        let file = self.target_file(reference)?;
        let value = self.lookup(&file, reference.path())?;
        self.resolve_value(value)
    }

    /// File a reference points into, loading a sibling if needed.
    fn target_file(&mut self, reference: &Reference) -> CfgResult<Rc<CfgFile>> {
        let origin = self.graph.file(reference.origin()).ok_or_else(|| {
            CfgError::unresolvable(&reference.to_string(), "origin file is not loaded")
                .with_file(reference.origin())
        })?;
        match reference.sibling() {
            Some(name) => self.graph.sibling(&origin, name),
            None => Ok(origin),
        }
    }

    /// Value at `class::name[/field...]` in `file`.
    ///
    /// A bare section path yields the section without resolving it.
    pub(crate) fn lookup(&mut self, file: &Rc<CfgFile>, path: &str) -> CfgResult<Value> {
        let mut segments = path.split('/');
        let head = segments.next().unwrap_or_default();
        let section = file.section(self.graph, head)?;
        let rest: Vec<&str> = segments.collect();
        let scope = section.id().to_string();
        self.navigate(Value::Section(section), &scope, &rest)
    }

    /// Follow `segments` below `current`, whose path is `scope`.
    ///
    /// Sections and maps are entered by key, lists by index.
    pub(crate) fn navigate(
        &mut self,
        mut current: Value,
        scope: &str,
        segments: &[&str],
    ) -> CfgResult<Value> {
        let mut scope = scope.to_string();
        for segment in segments {
            current = match current {
                Value::Section(section) => self.field(&section, segment)?.ok_or_else(|| {
                    CfgError::unknown_field(segment, section.id()).with_file(section.file())
                })?,
                Value::Map(mut map) => map
                    .swap_remove(*segment)
                    .ok_or_else(|| CfgError::unknown_field(segment, &scope))?,
                Value::List(mut items) => {
                    let index: usize = segment.parse().map_err(|_| {
                        CfgError::illegal_path(
                            &format!("{}/{}", scope, segment),
                            "list index must be a non-negative integer",
                        )
                    })?;
                    if index >= items.len() {
                        return Err(CfgError::unknown_field(segment, &scope));
                    }
                    items.swap_remove(index)
                }
                Value::Ref(reference) => {
                    return Err(CfgError::unresolvable(
                        &reference.to_string(),
                        "path continues through an unresolved reference",
                    ));
                }
                other => {
                    return Err(CfgError::illegal_path(
                        &format!("{}/{}", scope, segment),
                        &format!("{} is a {}", scope, other.kind()),
                    ));
                }
            };
            scope.push('/');
            scope.push_str(segment);
        }
        Ok(current)
    }
}
