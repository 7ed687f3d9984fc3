//! Replay configuration
//!
//! Configuration can be built in code or loaded from YAML:
//!
//! ```rust
//! use paintty::{ReplayConfig, ReplayMode};
//!
//! let config = ReplayConfig::from_yaml_str("mode: fullspeed\ntick_interval_ms: 20\n").unwrap();
//! assert_eq!(config.mode, ReplayMode::Fullspeed);
//! assert_eq!(config.tick_interval().as_millis(), 20);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::codec::DEFAULT_MAX_FRAME_LEN;
use crate::sources::DEFAULT_CHUNK_SIZE;
use crate::translate::EchoPolicy;
use crate::types::ReplayMode;
use crate::{ReplayError, Result};

/// Default drain cadence in throttled mode
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Default queue high-water mark
pub const DEFAULT_MAX_PENDING_DOCUMENTS: usize = 4096;

/// Settings for one replay session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Drain policy
    pub mode: ReplayMode,

    /// Drain tick period in milliseconds
    pub tick_interval_ms: u64,

    /// Largest frame body accepted; larger frames are skipped
    pub max_frame_len: u32,

    /// Stop reading the source while this many documents are queued
    pub max_pending_documents: usize,

    /// Read buffer size for file and reader sources
    pub read_chunk_size: usize,

    /// Skip documents authored by this client id
    pub suppress_client_id: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            mode: ReplayMode::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_pending_documents: DEFAULT_MAX_PENDING_DOCUMENTS,
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            suppress_client_id: None,
        }
    }
}

impl ReplayConfig {
    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ReplayConfig =
            serde_yaml_ng::from_str(yaml).map_err(|e| ReplayError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ReplayError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(ReplayError::config("tick_interval_ms must be greater than zero"));
        }
        if self.max_pending_documents == 0 {
            return Err(ReplayError::config("max_pending_documents must be greater than zero"));
        }
        if self.read_chunk_size == 0 {
            return Err(ReplayError::config("read_chunk_size must be greater than zero"));
        }
        Ok(())
    }

    pub fn fullspeed(mut self, fullspeed: bool) -> Self {
        self.mode = ReplayMode::from_fullspeed(fullspeed);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn echo_policy(&self) -> EchoPolicy {
        EchoPolicy::from_client_id(self.suppress_client_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ReplayConfig::default();
        assert_eq!(config.mode, ReplayMode::Throttled);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.echo_policy(), EchoPolicy::ReplayAll);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ReplayConfig::from_yaml_str("suppress_client_id: me\n").unwrap();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.echo_policy(), EchoPolicy::SuppressOwn { client_id: "me".into() });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ReplayConfig::from_yaml_str("speed: 3\n").unwrap_err();
        assert!(matches!(err, ReplayError::Config { .. }));
    }

    #[test]
    fn zero_tick_is_invalid() {
        assert!(ReplayConfig::from_yaml_str("tick_interval_ms: 0\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.yaml");
        std::fs::write(&path, "mode: throttled\nmax_pending_documents: 8\n").unwrap();

        let config = ReplayConfig::load(&path).unwrap();
        assert_eq!(config.max_pending_documents, 8);
        assert!(matches!(
            ReplayConfig::load(dir.path().join("missing.yaml")),
            Err(ReplayError::File { .. })
        ));
    }
}
