//! Command-line interface of the standalone analyzer

mod analyze;
mod output;

pub use output::{OutputFormat, OutputWriter};

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use triage_core::domain::ToolSpec;

/// Static triage of a single binary
#[derive(Parser, Debug)]
#[command(
    name = "triage-analyze",
    version,
    about = "Run static inspection tools against one file",
    long_about = "triage-analyze runs the configured inspection tools (file, strings, binwalk, \
                  radare2 by default) against one file and writes a <sha256>.json result \
                  bundle plus a 'completed' marker into the output directory.\n\n\
                  Missing or misbehaving tools are recorded in the bundle and never stop \
                  the remaining tools."
)]
pub struct Cli {
    /// File to analyze
    pub file: PathBuf,

    /// Directory receiving the result bundle and the completion marker
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Timeout per tool in seconds (defaults to the configured value)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Replace the tool set; repeatable, run in the given order
    #[arg(long = "tool", value_name = "NAME=PROGRAM [ARGS...]", value_parser = parse_tool_spec)]
    pub tools: Vec<ToolSpec>,

    /// Configuration file; its tools and limits apply when no --tool is given
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parse `NAME=PROGRAM [ARGS...]`.
///
/// Arguments are split on whitespace; `{file}` marks where the target goes,
/// otherwise it is appended.
fn parse_tool_spec(raw: &str) -> Result<ToolSpec, String> {
    let (name, command) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PROGRAM [ARGS...], got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("tool name cannot be empty".to_string());
    }

    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| format!("tool '{}' has no program", name))?;
    let args: Vec<&str> = parts.collect();

    Ok(ToolSpec::new(name, program, &args))
}

/// Exit codes
pub mod exit_codes {
    /// Bundle and marker written
    pub const SUCCESS: i32 = 0;
    /// Input file missing or unreadable
    pub const INPUT_ERROR: i32 = 1;
    /// Output directory, bundle or marker could not be written
    pub const OUTPUT_ERROR: i32 = 2;
    /// Configuration file could not be loaded
    pub const CONFIG_ERROR: i32 = 3;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = 99;
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub async fn run(self) -> anyhow::Result<i32> {
        init_tracing(self.cli.verbose);
        let output = OutputWriter::new(self.cli.format, self.cli.quiet);
        analyze::run(&self.cli, &output).await
    }
}

/// Compact stderr logging; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
