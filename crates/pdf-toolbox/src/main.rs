//! pdf-toolbox: command-line front end for the PDF tools.
//!
//! ```text
//! pdf-toolbox run compress report.pdf --level high -o out/
//! pdf-toolbox run merge a.pdf b.pdf -o merged.pdf
//! pdf-toolbox list --json
//! pdf-toolbox options txt-to-pdf
//! ```

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use pdf_toolbox::config;
use pdf_toolbox::ToolInfo;
use toolbox_core::options::ToolOptions;
use toolbox_core::progress::Progress;
use toolbox_core::source::SourceFile;
use toolbox_core::tool::ToolKind;
use toolbox_core::wizard::WizardBuilder;

#[derive(Parser)]
#[command(name = "pdf-toolbox", version, about = "Small PDF utilities")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Dump effective merged config as TOML and exit
    #[arg(long, global = true)]
    dump_config: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tool on one or more files
    Run {
        /// Tool name (see `list`)
        tool: String,

        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file or directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        flags: OptionFlags,
    },
    /// List the available tools
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the options a tool reads and their current values
    Options {
        /// Tool name
        tool: String,
    },
}

/// Per-run option overrides. Applied on top of the config files.
#[derive(Args, Default)]
struct OptionFlags {
    /// Compression level: low, medium, high
    #[arg(long)]
    level: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Page size: a4, letter, legal
    #[arg(long)]
    page_size: Option<String>,

    /// Page margin in millimetres
    #[arg(long)]
    margin: Option<f32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Image format: jpeg, png
    #[arg(long)]
    format: Option<String>,

    /// Rendering resolution
    #[arg(long)]
    dpi: Option<u16>,

    /// Output file name
    #[arg(long)]
    name: Option<String>,

    /// Do not insert page markers in extracted text
    #[arg(long)]
    no_page_markers: bool,

    /// Any option as key=value (repeatable)
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

/// Apply CLI flags on top of config-loaded options.
/// Only overrides when the flag was given.
fn apply_cli_overrides(opts: &mut ToolOptions, flags: &OptionFlags) -> Result<()> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut push = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            pairs.push((key.to_string(), value));
        }
    };
    push("level", flags.level.clone());
    push("font_size", flags.font_size.map(|v| v.to_string()));
    push("page_size", flags.page_size.clone());
    push("margin", flags.margin.map(|v| v.to_string()));
    push("quality", flags.quality.map(|v| v.to_string()));
    push("image_format", flags.format.clone());
    push("dpi", flags.dpi.map(|v| v.to_string()));
    push("name", flags.name.clone());
    if flags.no_page_markers {
        push("page_markers", Some("false".to_string()));
    }

    for assignment in &flags.set {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
        pairs.push((key.trim().to_string(), value.to_string()));
    }

    for (key, value) in pairs {
        opts.set(&key, &value)
            .with_context(|| format!("Invalid option {}={}", key, value))?;
    }
    Ok(())
}

fn parse_tool(name: &str) -> Result<ToolKind> {
    ToolKind::from_slug(name).with_context(|| {
        format!("Unknown tool '{}'. Run `pdf-toolbox list` to see all tools.", name)
    })
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose > 0 { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // Handle --dump-config
    if cli.dump_config {
        let mut opts = config::load_config();
        if let Some(Commands::Run { flags, .. }) = &cli.command {
            if let Err(e) = apply_cli_overrides(&mut opts, flags) {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        }
        match config::to_toml(&opts) {
            Ok(s) => {
                println!("{}", s);
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                process::exit(1);
            }
        }
    }

    let result = match &cli.command {
        Some(Commands::Run {
            tool,
            inputs,
            output,
            flags,
        }) => run_tool(tool, inputs, output, flags),
        Some(Commands::List { json }) => list_tools(*json),
        Some(Commands::Options { tool }) => show_options(tool),
        None => {
            eprintln!("Usage: pdf-toolbox run <tool> <inputs...> [-o <output>] [options]");
            eprintln!("   or: pdf-toolbox list");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run_tool(
    tool: &str,
    inputs: &[PathBuf],
    output: &Path,
    flags: &OptionFlags,
) -> Result<()> {
    let kind = parse_tool(tool)?;

    // Build options: config files → CLI overrides
    let mut options = config::load_config();
    apply_cli_overrides(&mut options, flags)?;

    let mut wizard = WizardBuilder::new()
        .tool(pdf_toolbox::tool_for(kind))
        .defaults(options)
        .progress_reporter(Box::new(|progress, msg| match progress {
            Progress::Indeterminate => log::info!("[ .. ] {}", msg),
            Progress::Determinate { done, total } if done < total => {
                log::info!("[{:3.0}%] {}", progress.fraction().unwrap_or(0.0) * 100.0, msg)
            }
            Progress::Determinate { .. } => log::debug!("[100%] {}", msg),
        }))
        .build()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let sources = inputs
        .iter()
        .map(|path| {
            SourceFile::from_path(path).with_context(|| format!("Reading {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    wizard
        .select(sources)
        .with_context(|| format!("{} cannot take these files", wizard.tool().name()))?;

    let outcome = wizard.process().map(|_| ());
    if let Err(e) = outcome {
        if let Some(failure) = wizard.failure() {
            for item in &failure.diagnostics {
                eprintln!("  - {}", item);
            }
        }
        return Err(anyhow::anyhow!("{}", e));
    }

    let written = wizard
        .download(output)
        .with_context(|| format!("Writing result to {}", output.display()))?;
    log::info!("Done!");
    println!("{}", written.display());
    Ok(())
}

fn list_tools(json: bool) -> Result<()> {
    let infos: Vec<ToolInfo> = pdf_toolbox::all_tools()
        .iter()
        .map(|t| ToolInfo::of(t.as_ref()))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for info in &infos {
        let count = match (info.min_files, info.max_files) {
            (1, Some(1)) => "1 file".to_string(),
            (min, None) => format!("{}+ files", min),
            (min, Some(max)) => format!("{}-{} files", min, max),
        };
        println!(
            "{:<14} {:<20} {:<14} {}",
            info.slug,
            info.name,
            info.accepts.join(","),
            count
        );
    }
    Ok(())
}

fn show_options(tool: &str) -> Result<()> {
    let kind = parse_tool(tool)?;
    let tool = pdf_toolbox::tool_for(kind);
    let options = config::load_config();

    println!("{} ({})", tool.name(), kind);
    for key in tool.option_keys() {
        println!(
            "  {:<18} {:<10} {}",
            key.name(),
            options.get(*key),
            key.description()
        );
    }
    Ok(())
}
