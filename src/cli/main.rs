//! ABG Remover CLI tool
//!
//! Command-line front end for the batch-processing core: submits the given
//! image files as one batch, renders progress with an indicatif bar, and
//! stops cooperatively on Ctrl-C.

use crate::controller::BatchController;
use crate::ports::{AutoConfirm, ConfirmationPort, ProgressDisplay};
use crate::processor::ExternalCommandProcessor;
use crate::settings::{keys, JsonSettingsStore, SettingsStore};
use crate::tracing_config::TracingConfig;
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "abgremover",
    version,
    about = "Remove image backgrounds in batch using an external model runner"
)]
pub struct Cli {
    /// Image files to process as one batch
    pub inputs: Vec<PathBuf>,

    /// Path to the model artifact (default: model/isnetis.onnx beside the executable)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Model runner executable, invoked as `<runner> <model> <input> <output>`
    #[arg(long, default_value = "abgr-runner")]
    pub runner: PathBuf,

    /// Output directory, persisted as the save location (default: beside each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep only .png inputs instead of submitting the selection as-is
    #[arg(long)]
    pub filter_png: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Confirmation port backed by an interactive terminal prompt
struct StdinConfirm;

impl ConfirmationPort for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Progress display backed by an indicatif bar
struct IndicatifDisplay {
    bar: ProgressBar,
}

impl IndicatifDisplay {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    fn finish(&self, message: String) {
        self.bar.finish_with_message(message);
    }
}

impl ProgressDisplay for IndicatifDisplay {
    fn set_value(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn set_label(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn set_close_enabled(&self, _enabled: bool) {
        // A terminal has no close button to unlock
    }
}

/// Default model location: `model/isnetis.onnx` beside the executable
fn default_model_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the current executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join("model").join("isnetis.onnx"))
}

/// CLI entry point
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    TracingConfig::new().with_verbosity(cli.verbose).init()?;

    if cli.inputs.is_empty() {
        anyhow::bail!("no input files given; pass one or more images to process");
    }

    let settings = Arc::new(
        JsonSettingsStore::open_default().context("failed to open the settings store")?,
    );
    if let Some(output) = &cli.output {
        std::fs::create_dir_all(output)
            .with_context(|| format!("cannot create output directory '{}'", output.display()))?;
        let canonical = std::fs::canonicalize(output)?;
        settings.set(keys::SAVE_LOCATION, &canonical.to_string_lossy())?;
    }

    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => default_model_path()?,
    };
    let processor = Arc::new(ExternalCommandProcessor::new(&cli.runner));
    let confirm: Arc<dyn ConfirmationPort> = if cli.yes {
        Arc::new(AutoConfirm::new(true))
    } else {
        Arc::new(StdinConfirm)
    };

    let controller = BatchController::new(model_path, processor, settings, confirm)
        .context("the model file does not exist; pass --model or place it at model/isnetis.onnx")?;

    // The batch requires absolute paths; resolve and order the selection
    let mut inputs = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let resolved = std::fs::canonicalize(input)
            .with_context(|| format!("cannot resolve input '{}'", input.display()))?;
        inputs.push(resolved);
    }
    inputs.sort();

    let display = Arc::new(IndicatifDisplay::new());
    let Some(mut session) = controller.submit_files(&inputs, cli.filter_png, display.clone())?
    else {
        info!("nothing to process");
        return Ok(());
    };

    // Ctrl-C requests a cooperative stop; the current item finishes first
    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current item");
            stop.request_stop();
        }
    });

    let summary = session
        .wait()
        .await
        .context("batch worker terminated abnormally")?;

    let succeeded = summary.processed - summary.failures.len();
    if summary.cancelled {
        display.finish(format!(
            "Cancelled after {} item(s) ({} failed)",
            summary.processed,
            summary.failures.len()
        ));
    } else {
        display.finish(format!(
            "Completed! Processed: {succeeded}, Failed: {}",
            summary.failures.len()
        ));
    }
    for failure in &summary.failures {
        warn!("failed: {}: {}", failure.path.display(), failure.error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "abgremover",
            "a.png",
            "b.png",
            "--filter-png",
            "-y",
            "-vv",
            "--output",
            "/tmp/out",
        ]);
        assert_eq!(cli.inputs.len(), 2);
        assert!(cli.filter_png);
        assert!(cli.yes);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.runner, PathBuf::from("abgr-runner"));
        assert!(cli.model.is_none());
    }
}
