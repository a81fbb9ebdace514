//! CLI command definitions for supercfg
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Inspect and resolve supercfg configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML file of enumerations for `enum:` literals (repeatable)
    #[arg(long = "enums", global = true)]
    pub enums: Vec<PathBuf>,

    /// Placeholder override, NAME=VALUE (repeatable)
    #[arg(short = 'D', long = "define", global = true, value_name = "NAME=VALUE")]
    pub defines: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved value at class::name[/field...]
    Get {
        file: PathBuf,
        path: String,
        /// Output format: json or text
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List section identifiers with their parents
    Sections { file: PathBuf },

    /// Print every section of a file, fully resolved
    Dump {
        file: PathBuf,
        /// Output format: json or text
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

/// Parse `-D NAME=VALUE` arguments; later definitions win.
pub fn parse_defines(defines: &[String]) -> Result<IndexMap<String, String>> {
    let mut out = IndexMap::new();
    for define in defines {
        let Some((name, value)) = define.split_once('=') else {
            bail!("invalid define '{}': expected NAME=VALUE", define);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("invalid define '{}': empty name", define);
        }
        out.insert(name.to_string(), value.to_string());
    }
    Ok(out)
}
