//! Options shared by every file loaded through one [`Cfg`](crate::Cfg).

use crate::enums::EnumRegistry;
use crate::provider::{FileProvider, FsProvider};
use crate::template::TemplateSubstitutor;
use std::fmt;
use std::rc::Rc;

/// Collaborators used while loading and resolving configuration.
#[derive(Clone)]
pub struct CfgOptions {
    /// Where file content comes from.
    pub provider: Rc<dyn FileProvider>,
    /// Enumerations available to `enum:` literals.
    pub enums: Rc<EnumRegistry>,
    /// `$(NAME)` substitution applied to the strings each section declares.
    pub substitutor: TemplateSubstitutor,
}

impl Default for CfgOptions {
    fn default() -> Self {
        Self {
            provider: Rc::new(FsProvider),
            enums: Rc::new(EnumRegistry::new()),
            substitutor: TemplateSubstitutor::new(),
        }
    }
}

impl CfgOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `provider` for all file access (builder pattern).
    pub fn with_provider(mut self, provider: impl FileProvider + 'static) -> Self {
        self.provider = Rc::new(provider);
        self
    }

    /// Use a provider the caller keeps a handle to, e.g. to inspect it later.
    pub fn with_shared_provider<P: FileProvider + 'static>(mut self, provider: Rc<P>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_enums(mut self, enums: EnumRegistry) -> Self {
        self.enums = Rc::new(enums);
        self
    }

    /// Replace the builtin placeholder table with `lookup`.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.substitutor = TemplateSubstitutor::with_lookup(lookup);
        self
    }
}

impl fmt::Debug for CfgOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CfgOptions")
            .field("enums", &self.enums.len())
            .field("substitutor", &self.substitutor)
            .finish_non_exhaustive()
    }
}
