//! Mapper configuration.

use map_registration::RegistrarConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for [`MultiSessionMapper`](crate::MultiSessionMapper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Registration parameters for every merge.
    pub registrar: RegistrarConfig,
    /// Re-attempt rejected sessions whenever a session registers, since the
    /// new geometry may supply the overlap they lacked.
    pub retry_rejected_on_success: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            registrar: RegistrarConfig::default(),
            retry_rejected_on_success: true,
        }
    }
}

impl MapperConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or invalid registrar settings.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the registrar configuration.
    #[must_use]
    pub fn with_registrar(mut self, registrar: RegistrarConfig) -> Self {
        self.registrar = registrar;
        self
    }

    /// Enables or disables automatic retries.
    #[must_use]
    pub const fn with_retry_on_success(mut self, enabled: bool) -> Self {
        self.retry_rejected_on_success = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrar configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.registrar.validate()?;
        Ok(())
    }
}
