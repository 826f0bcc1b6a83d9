// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration loaded from TOML.
//!
//! ```toml
//! [queue]
//! max_pending = 10000
//!
//! [trace]
//! messages = true
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use std::fs;
use std::path::{Path, PathBuf};

use nexus_msgq::{QueueLimits, DEFAULT_MAX_PENDING};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("queue.max_pending must be at least 1")]
    ZeroLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub queue: QueueConfig,
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Posted messages a single queue may hold before posts fail.
    pub max_pending: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_pending: DEFAULT_MAX_PENDING }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Log every message syscall with its decoded message.
    pub messages: bool,
}

impl Config {
    pub fn from_toml_str(origin: &str, text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)
            .map_err(|source| ConfigError::Parse { origin: origin.to_string(), source })?;
        if config.queue.max_pending == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&path.display().to_string(), &text)
    }

    pub fn queue_limits(&self) -> QueueLimits {
        QueueLimits { max_pending: self.queue.max_pending }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("inline", "").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.queue_limits().max_pending, DEFAULT_MAX_PENDING);
        assert!(!config.trace.messages);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = Config::from_toml_str("inline", "[trace]\nmessages = true\n").unwrap();
        assert!(config.trace.messages);
        assert_eq!(config.queue.max_pending, DEFAULT_MAX_PENDING);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("inline", "[queue]\nmax_posted = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin == "inline"));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = Config::from_toml_str("inline", "[queue]\nmax_pending = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLimit));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\nmax_pending = 4").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.queue_limits(), QueueLimits { max_pending: 4 });
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        match Config::load(&missing) {
            Err(ConfigError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
