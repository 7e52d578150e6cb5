//! Console output

use clap::ValueEnum;
use serde::Serialize;

/// Output format for analysis results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `[+]` progress lines and a short summary
    #[default]
    Plain,
    /// The full result bundle as JSON on stdout
    Json,
}

/// Writes user-facing output according to the selected format
pub struct OutputWriter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Progress line; only shown in plain mode
    pub fn info(&self, message: &str) {
        if !self.quiet && self.format == OutputFormat::Plain {
            println!("[+] {}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("[!] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("[-] {}", message);
    }

    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
