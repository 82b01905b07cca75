//! Adapter configuration

use serde::{Deserialize, Serialize};
use url::Url;

use tidemark_navigation::MemoryNavigator;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin the in-memory history resolves paths against
    pub origin: String,
    /// First entry of the in-memory history
    pub initial_path: String,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Upper bound on scheduler turns when draining deferred work
    pub max_ticks: usize,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let origin = Url::parse(&self.origin)
            .map_err(|e| CoreError::Config(format!("origin {:?}: {}", self.origin, e)))?;
        if origin.host().is_none() {
            return Err(CoreError::Config(format!(
                "origin {:?} has no host",
                self.origin
            )));
        }

        if !self.initial_path.starts_with('/') {
            return Err(CoreError::Config(format!(
                "initial_path {:?} must start with '/'",
                self.initial_path
            )));
        }

        if self.max_ticks == 0 {
            return Err(CoreError::Config("max_ticks must be positive".to_string()));
        }

        Ok(())
    }

    /// A fresh single-entry history at `origin` + `initial_path`
    pub fn memory_navigator(&self) -> Result<MemoryNavigator> {
        Ok(MemoryNavigator::new(&self.origin, &self.initial_path)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            initial_path: "/".to_string(),
            log_filter: "info".to_string(),
            max_ticks: 64,
        }
    }
}
