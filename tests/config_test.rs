// Test configuration loading
use clap::Parser;
use ct_scan::cli::Cli;
use ct_scan::config::Config;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_load_test_config() {
    let config_path = Path::new("tests/test_config.toml");
    let config = Config::from_file(config_path).expect("Failed to load test config");

    assert_eq!(config.log.url.as_deref(), Some("https://ct.example.com/logs/2025h2/"));
    assert!(config.log.public_key.is_some());

    assert_eq!(config.scanner.batch_size, 512);
    assert_eq!(config.scanner.workers, 4);
    assert!(!config.scanner.quiet);

    assert_eq!(config.retry.max_attempts, 6);
    // base_wait_secs is not in the file and keeps its default
    assert_eq!(config.retry.base_wait_secs, 1);
    assert_eq!(config.retry.max_wait_secs, 30);

    assert_eq!(config.state.file, "/tmp/ct-scan-test-state.toml");
    assert_eq!(config.logging.level, "info");

    assert!(config.validate().is_ok());
}

#[test]
fn test_scanner_config_from_file() {
    let config = Config::from_file(Path::new("tests/test_config.toml")).unwrap();
    let scanner = config.scanner_config(false);

    assert_eq!(scanner.batch_size, 512);
    assert_eq!(scanner.workers, 4);
    assert!(!scanner.progress);
    assert_eq!(scanner.retry.max_attempts(), 6);
    assert_eq!(scanner.retry.next_wait(Duration::from_secs(20)), Duration::from_secs(30));
}

#[test]
fn test_cli_overrides_file() {
    let mut config = Config::from_file(Path::new("tests/test_config.toml")).unwrap();
    let cli = Cli::parse_from(["ct-scan", "--workers", "0", "-v"]);
    cli.apply_overrides(&mut config);

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.scanner.batch_size, 512);
    assert!(config.validate().is_err());
}
