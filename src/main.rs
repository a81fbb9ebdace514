//! supercfg command line tool.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use supercfg::cli::{Cli, Command, parse_defines};
use supercfg::format::{OutputFormat, format_section_list, format_sections, format_value};
use supercfg::logging::{self, LogTarget};
use supercfg::{Cfg, CfgOptions, EnumRegistry, template};
use tracing::{debug, info};

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(format)
        .ok_or_else(|| anyhow!("unknown format '{}': expected json or text", format))
}

fn options(cli: &Cli) -> Result<CfgOptions> {
    let mut enums = EnumRegistry::new();
    for path in &cli.enums {
        let loaded = EnumRegistry::load(path)
            .with_context(|| format!("loading enums from {}", path.display()))?;
        debug!(path = %path.display(), types = loaded.len(), "loaded enums");
        enums.merge(loaded);
    }

    let mut options = CfgOptions::new().with_enums(enums);
    if !cli.defines.is_empty() {
        let defines = parse_defines(&cli.defines)?;
        info!(count = defines.len(), "using placeholder overrides");
        options = options.with_lookup(move |name| {
            defines
                .get(name)
                .cloned()
                .or_else(|| template::builtin(name))
        });
    }
    Ok(options)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let options = options(&cli)?;
    let output = match &cli.command {
        Command::Get { file, path, format } => {
            let format = parse_format(format)?;
            let cfg = Cfg::load_with(file, options)?;
            format_value(&cfg.get(path)?, format)?
        }
        Command::Sections { file } => {
            let cfg = Cfg::load_with(file, options)?;
            format_section_list(&cfg.sections()?)
        }
        Command::Dump { file, format } => {
            let format = parse_format(format)?;
            let cfg = Cfg::load_with(file, options)?;
            let output = format_sections(&cfg.sections()?, format)?;
            debug!(files = cfg.parsed_files(), "dump complete");
            output
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
