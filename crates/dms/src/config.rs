//! DMS configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::DmsError;

/// Environment variable prefix, e.g. `DMS_EAR_THRESHOLD=0.25`
pub const ENV_PREFIX: &str = "DMS";

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Openness ratio below which the eyes count as closed
    pub ear_threshold: f32,

    /// Eyes closed threshold for drowsiness (milliseconds)
    pub min_closed_duration_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.22,
            min_closed_duration_ms: 1000,
        }
    }
}

impl DmsConfig {
    /// Create strict config (eyes count as closed earlier)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.25,
            ..Default::default()
        }
    }

    /// Create lenient config (eyes must close further)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.20,
            ..Default::default()
        }
    }

    pub fn min_closed_duration(&self) -> Duration {
        Duration::from_millis(self.min_closed_duration_ms)
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.ear_threshold > 0.0 && self.ear_threshold <= 0.5) {
            return Err(DmsError::Config(format!(
                "ear_threshold {} is out of range (0, 0.5]",
                self.ear_threshold
            )));
        }
        if self.min_closed_duration_ms == 0 {
            return Err(DmsError::Config(
                "min_closed_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration: defaults, then an optional file, then `DMS_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, DmsError> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Self::default()).map_err(|e| DmsError::Config(e.to_string()))?,
        );

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DmsError::Config(e.to_string()))?;

        config.validate()?;
        info!(
            ear_threshold = config.ear_threshold,
            min_closed_duration_ms = config.min_closed_duration_ms,
            "Loaded DMS configuration"
        );
        Ok(config)
    }
}
