// src/main.rs
use anyhow::Context;
use clap::Parser;
use ct_scan::cli::Cli;
use ct_scan::config::Config;
use ct_scan::merkle::MerkleTreeBuilder;
use ct_scan::scanner::Scanner;
use ct_scan::signature::{EcdsaSthVerifier, SthVerifier};
use ct_scan::state::StateManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    cli.validate()?;

    // Load config file, falling back to defaults when none is given
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config file {}", path))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);

    // Initialize logging on stderr so stdout carries only entry records
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli, config).await {
        tracing::error!("Scan failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let Some(log_url) = config.log.url.clone() else {
        anyhow::bail!("No CT log URL configured");
    };

    let verifier: Option<Arc<dyn SthVerifier>> = match config.log.public_key {
        Some(ref key) => Some(Arc::new(
            EcdsaSthVerifier::from_base64(key).context("Invalid log public key")?,
        )),
        None => {
            tracing::warn!("No public key configured, tree head signatures will not be checked");
            None
        }
    };

    let scanner = Scanner::connect(
        log_url.clone(),
        verifier,
        config.scanner_config(cli.should_show_progress()),
    )?;
    let state = StateManager::new(PathBuf::from(&config.state.file)).await?;
    let processor = cli.output_format().processor();

    tracing::info!("Starting ct-scan for {}", log_url);

    let sth = scanner.get_sth().await?;
    tracing::info!(
        "Current tree head: size {} timestamp {} root {}",
        sth.tree_size,
        sth.timestamp,
        hex::encode(sth.root_hash)
    );

    let mut tree = match state.get_sth(&log_url).await {
        None if cli.start_at_end => {
            tracing::info!("First contact with log, recording tree head without scanning");
            state.set_sth(&log_url, sth).await;
            state.save().await?;
            return Ok(());
        }
        None => Some(MerkleTreeBuilder::new()),
        Some(previous) => {
            let check = scanner.check_consistency(&previous, &sth).await?;
            if !check.valid {
                anyhow::bail!(
                    "Tree head of size {} is not consistent with previously verified size {}",
                    sth.tree_size,
                    previous.tree_size
                );
            }
            tracing::info!(
                "Tree head is consistent with previous size {}",
                previous.tree_size
            );
            check.tree_builder
        }
    };

    match tree.as_mut() {
        Some(builder) if builder.size() < sth.tree_size => {
            scanner
                .scan(builder.size(), sth.tree_size, Arc::clone(&processor), Some(&mut *builder))
                .await?;

            if builder.root() != sth.root_hash {
                anyhow::bail!(
                    "Entries 0 to {} do not hash to the signed root {}",
                    sth.tree_size,
                    hex::encode(sth.root_hash)
                );
            }
            tracing::info!("Verified {} entries against the signed root", sth.tree_size);
        }
        _ => tracing::info!("No new entries to scan"),
    }

    state.set_sth(&log_url, sth).await;
    tracing::info!("Saving state...");
    state.save().await?;

    Ok(())
}
