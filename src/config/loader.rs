// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to get
/// typed settings.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "config file parsed");

    Ok(config)
}

/// Load a configuration file and validate it into a [`ConfigFile`].
///
/// - Reads TOML.
/// - Applies defaults for missing keys.
/// - Rejects a zero or malformed `concurrency` and malformed durations.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Nodeflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Nodeflow.toml")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::errors::NodeflowError;
    use crate::types::ConcurrencyLimit;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = write_config("");
        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg, ConfigFile::default());
        assert_eq!(
            cfg.engine.concurrency,
            ConcurrencyLimit::Bounded(NonZeroUsize::new(10).unwrap())
        );
        assert_eq!(cfg.engine.node_timeout, None);
    }

    #[test]
    fn reads_engine_section() {
        let file = write_config(
            r#"
[engine]
concurrency = "unbounded"
node_timeout = "1500ms"
"#,
        );
        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.engine.concurrency, ConcurrencyLimit::Unbounded);
        assert_eq!(cfg.engine.node_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, NodeflowError::IoError(_)));
    }

    #[test]
    fn unknown_keys_are_toml_errors() {
        let file = write_config("[engine]\nworkers = 3\n");
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, NodeflowError::TomlError(_)));
    }
}
