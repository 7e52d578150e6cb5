//! Analyze - fingerprint one file, run the tool sequence, write the bundle

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use triage_core::Config;
use triage_core::domain::{ResultBundle, ToolSpec};
use triage_core::infrastructure::{fingerprint_file, write_bundle, write_completion_marker};
use triage_sandbox::{ProcessToolRunner, SandboxPolicy, ToolSequence};

use crate::cli::exit_codes;
use crate::cli::{Cli, OutputFormat, OutputWriter};

/// Run the analysis described by `cli`, returning the process exit code.
pub async fn run(cli: &Cli, output: &OutputWriter) -> Result<i32> {
    let config = match cli.config.as_deref() {
        Some(path) => match Config::load_from(Some(path)) {
            Ok(config) => Some(config),
            Err(e) => {
                output.error(&format!("Failed to load configuration: {}", e));
                return Ok(exit_codes::CONFIG_ERROR);
            }
        },
        None => None,
    };

    if !cli.file.is_file() {
        output.error(&format!("File does not exist: {}", cli.file.display()));
        return Ok(exit_codes::INPUT_ERROR);
    }

    output.info(&format!("Starting analysis of: {}", cli.file.display()));

    let (hashes, filesize) = match fingerprint_file(&cli.file).await {
        Ok(fingerprinted) => fingerprinted,
        Err(e) => {
            output.error(&format!("Cannot read {}: {}", cli.file.display(), e));
            return Ok(exit_codes::INPUT_ERROR);
        }
    };
    debug!(sha256 = %hashes.sha256, filesize, "File fingerprinted");

    let sequence = build_sequence(cli, config.as_ref());
    let outcomes = sequence.run_all(&cli.file).await;

    let filename = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    let bundle = ResultBundle::new(filename, filesize, hashes, Utc::now(), outcomes);

    let bundle_path = match persist(&cli.output_dir, &bundle).await {
        Ok(path) => path,
        Err(e) => {
            output.error(&format!(
                "Failed to write results to {}: {}",
                cli.output_dir.display(),
                e
            ));
            return Ok(exit_codes::OUTPUT_ERROR);
        }
    };
    info!(bundle = %bundle_path.display(), "Analysis written");

    match output.format() {
        OutputFormat::Json => output.json(&bundle)?,
        OutputFormat::Plain => {
            output.info(&format!("Size: {} bytes", bundle.metadata.filesize));
            output.info(&format!("SHA256: {}", bundle.metadata.hashes.sha256));
            for tool in sequence.tools() {
                if let Some(outcome) = bundle.tools.get(&tool.name) {
                    output.info(&format!("{}: exit code {}", tool.name, outcome.exit_code));
                    if outcome.exit_code < 0 {
                        output.warn(&format!("{}: {}", tool.name, outcome.stderr.trim()));
                    }
                }
            }
            output.info(&format!(
                "Analysis finished. Results written to: {}",
                bundle_path.display()
            ));
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Tools: `--tool` flags, else the configuration file, else the standalone set.
fn build_sequence(cli: &Cli, config: Option<&Config>) -> ToolSequence {
    let tools: Vec<ToolSpec> = if !cli.tools.is_empty() {
        cli.tools.clone()
    } else if let Some(config) = config {
        config.analysis.tools.clone()
    } else {
        ToolSpec::standalone_set()
    };

    let default_timeout = config
        .map(|c| c.analysis.tool_timeout_seconds)
        .unwrap_or(60);
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(default_timeout).max(1));

    let policy = match config {
        Some(config) => SandboxPolicy::from_config(&config.sandbox, timeout),
        None => SandboxPolicy::default().with_timeout(timeout),
    };

    ToolSequence::new(tools, Arc::new(ProcessToolRunner::new()), policy)
}

async fn persist(dir: &Path, bundle: &ResultBundle) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let bundle_name = write_bundle(dir, bundle).await?;
    write_completion_marker(dir, &bundle_name).await?;
    Ok(dir.join(bundle_name))
}
