// tests/config_loading.rs

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use tempfile::NamedTempFile;

use nodeflow::config::load_and_validate;
use nodeflow::errors::NodeflowError;
use nodeflow::types::ConcurrencyLimit;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn numeric_concurrency_and_timeout() {
    let file = config_file(
        r#"
[engine]
concurrency = 4
node_timeout = "2s"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(
        cfg.engine.concurrency,
        ConcurrencyLimit::Bounded(NonZeroUsize::new(4).unwrap())
    );
    assert_eq!(cfg.engine.node_timeout, Some(Duration::from_secs(2)));
}

#[test]
fn zero_concurrency_returns_config_error() {
    let file = config_file("[engine]\nconcurrency = 0\n");

    match load_and_validate(file.path()) {
        Err(NodeflowError::ConfigError(msg)) => {
            assert!(msg.contains("concurrency"));
            assert!(msg.contains(">= 1"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_concurrency_word_returns_config_error() {
    let file = config_file("[engine]\nconcurrency = \"plenty\"\n");

    match load_and_validate(file.path()) {
        Err(NodeflowError::ConfigError(msg)) => assert!(msg.contains("plenty")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_timeout_returns_config_error() {
    let file = config_file("[engine]\nnode_timeout = \"5 fortnights\"\n");

    match load_and_validate(file.path()) {
        Err(NodeflowError::ConfigError(msg)) => assert!(msg.contains("node_timeout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_toml_returns_toml_error() {
    let file = config_file("[engine\nconcurrency = 2\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(NodeflowError::TomlError(_))
    ));
}
