// src/cli.rs
use clap::Parser;

use crate::config::Config;
use crate::output::OutputFormat;

/// ct-scan: Certificate Transparency log scanner
///
/// Fetches every entry of a CT log, verifies the signed tree head and proves
/// the log stayed append-only since the previous run.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Path to TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// CT log base URL, overrides [log] url
    #[arg(long = "log-url")]
    pub log_url: Option<String>,

    /// Base64 DER public key of the log, overrides [log] public_key
    #[arg(long = "public-key")]
    pub public_key: Option<String>,

    /// State file holding the last verified tree heads
    #[arg(long = "state-file")]
    pub state_file: Option<String>,

    // ===== Performance =====
    /// Entries requested per get-entries call
    #[arg(long = "batch-size")]
    pub batch_size: Option<u64>,

    /// Concurrent entry processors
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// On first contact with a log, record its tree head without scanning
    #[arg(long = "start-at-end")]
    pub start_at_end: bool,

    // ===== Output Format =====
    /// Output entries in JSONL format to stdout
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Output entries in CSV format to stdout
    #[arg(long = "csv")]
    pub csv: bool,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn and silence fetch progress)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json or --csv"
            );
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Human
        }
    }

    /// Progress bar only accompanies human output
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.json && !self.csv
    }

    /// Log level forced by -v/-q, if any
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.log_url {
            config.log.url = Some(url.clone());
        }
        if let Some(ref key) = self.public_key {
            config.log.public_key = Some(key.clone());
        }
        if let Some(ref file) = self.state_file {
            config.state.file = file.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.scanner.batch_size = batch_size;
        }
        if let Some(workers) = self.workers {
            config.scanner.workers = workers;
        }
        if self.quiet {
            config.scanner.quiet = true;
        }
        if let Some(level) = self.log_level() {
            config.logging.level = level.to_string();
        }
    }
}
