// src/config/validate.rs

use std::num::NonZeroUsize;

use crate::config::model::{ConfigFile, EngineSection, RawConcurrency, RawConfigFile, RawEngineSection};
use crate::errors::{NodeflowError, Result};
use crate::types::{ConcurrencyLimit, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = NodeflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        Ok(ConfigFile {
            engine: validate_engine(raw.engine)?,
        })
    }
}

fn validate_engine(raw: RawEngineSection) -> Result<EngineSection> {
    let concurrency = match raw.concurrency {
        None => ConcurrencyLimit::default(),
        Some(value) => validate_concurrency(value)?,
    };

    let node_timeout = match raw.node_timeout {
        None => None,
        Some(s) => {
            let limit = parse_duration(&s).map_err(|e| {
                NodeflowError::ConfigError(format!("[engine].node_timeout: {e}"))
            })?;
            if limit.is_zero() {
                return Err(NodeflowError::ConfigError(
                    "[engine].node_timeout must be greater than zero".to_string(),
                ));
            }
            Some(limit)
        }
    };

    Ok(EngineSection {
        concurrency,
        node_timeout,
    })
}

fn validate_concurrency(raw: RawConcurrency) -> Result<ConcurrencyLimit> {
    match raw {
        RawConcurrency::Count(n) => usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(ConcurrencyLimit::Bounded)
            .ok_or_else(|| {
                NodeflowError::ConfigError(format!(
                    "[engine].concurrency must be >= 1 (got {n})"
                ))
            }),
        RawConcurrency::Named(s) => s
            .parse()
            .map_err(|e| NodeflowError::ConfigError(format!("[engine].concurrency: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(concurrency: Option<RawConcurrency>, node_timeout: Option<&str>) -> RawConfigFile {
        RawConfigFile {
            engine: RawEngineSection {
                concurrency,
                node_timeout: node_timeout.map(str::to_string),
            },
        }
    }

    #[test]
    fn rejects_non_positive_concurrency() {
        for n in [0, -3] {
            let err = ConfigFile::try_from(engine(Some(RawConcurrency::Count(n)), None)).unwrap_err();
            assert!(matches!(err, NodeflowError::ConfigError(ref msg) if msg.contains(">= 1")));
        }
    }

    #[test]
    fn named_concurrency_accepts_numbers_and_unbounded() {
        let cfg = ConfigFile::try_from(engine(Some(RawConcurrency::Named("3".into())), None)).unwrap();
        assert_eq!(
            cfg.engine.concurrency,
            ConcurrencyLimit::Bounded(NonZeroUsize::new(3).unwrap())
        );

        let cfg =
            ConfigFile::try_from(engine(Some(RawConcurrency::Named("unbounded".into())), None)).unwrap();
        assert_eq!(cfg.engine.concurrency, ConcurrencyLimit::Unbounded);

        assert!(ConfigFile::try_from(engine(Some(RawConcurrency::Named("many".into())), None)).is_err());
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert!(ConfigFile::try_from(engine(None, Some("soon"))).is_err());
        assert!(ConfigFile::try_from(engine(None, Some("0s"))).is_err());
    }
}
