//! supercfg: INI-based configuration with typed values, references,
//! inheritance and cross-file lookup.
//!
//! ```
//! use supercfg::{Cfg, Value};
//!
//! let cfg = Cfg::from_text(
//!     "[model::base]\ndepth = 4\nopts = {'lr': 0.1}\n\
//!      [model::small(base)]\nopts = {'wd': 0.0}\nname = 'small_$(TAG)'",
//! )
//! .unwrap();
//! let small = cfg.section("model::small").unwrap();
//! assert_eq!(small.get("depth").unwrap(), Value::Int(4));
//! assert_eq!(small.get("opts/lr").unwrap(), Value::Float(0.1));
//! ```

pub mod cfg;
pub mod cli;
pub mod enums;
pub mod error;
pub mod format;
pub mod ini;
pub mod logging;
pub mod options;
pub mod parser;
pub mod provider;
pub mod resolve;
pub mod section;
pub mod template;
pub mod value;

pub use cfg::Cfg;
pub use enums::{EnumDef, EnumRegistry, EnumValue};
pub use error::{CfgError, CfgResult, ErrorCode};
pub use options::CfgOptions;
pub use provider::{FileProvider, FsProvider, MemoryProvider};
pub use section::Section;
pub use template::TemplateSubstitutor;
pub use value::{Map, Reference, Value};
