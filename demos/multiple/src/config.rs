//! Demo configuration - observer/publisher counts and timing
//!
//! Loaded from a RON file whose path is the first command-line argument.
//! Every field is optional:
//!
//! ```ron
//! (
//!     observers: 10,
//!     publishers: 1,
//!     interval_ms: 1000,
//!     duration_ms: 10000,
//!     initial: 1,
//!     verbose: false,
//! )
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a demo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of observer threads, each with its own stream (at least 1)
    pub observers: usize,
    /// Number of publisher threads updating the property (at least 1)
    pub publishers: usize,
    /// Pause between updates from each publisher
    pub interval_ms: u64,
    /// How long the demo runs before every thread is cancelled
    pub duration_ms: u64,
    /// Initial property value
    pub initial: i64,
    /// Log at trace level instead of info
    pub verbose: bool,
}

impl DemoConfig {
    /// Load a configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        Ok(config.clamped())
    }

    /// Clamp counts to at least one thread each
    pub fn clamped(mut self) -> Self {
        self.observers = self.observers.max(1);
        self.publishers = self.publishers.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            observers: 10,
            publishers: 1,
            interval_ms: 1000,
            duration_ms: 10_000,
            initial: 1,
            verbose: false,
        }
    }
}
