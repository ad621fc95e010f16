//! Application configuration
//!
//! This module re-exports shared types from skirmish-types and provides
//! persistence for AppConfig.

pub use skirmish_types::{AppConfig, SyncSettings, TrackerSettings};
use uuid::Uuid;

use super::error::ConfigError;

const APP_NAME: &str = "skirmish";
const CONFIG_NAME: &str = "config";

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn game_uuid(&mut self) -> Uuid;
}

impl AppConfigExt for AppConfig {
    /// Load from disk, falling back to defaults on any error
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            Self::default()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    /// The configured game id, generating one when missing or malformed
    fn game_uuid(&mut self) -> Uuid {
        if let Some(id) = self.game_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) {
            return id;
        }
        if let Some(bad) = &self.game_id {
            tracing::warn!(game_id = %bad, "Invalid game id in config, generating a new one");
        }
        let id = Uuid::new_v4();
        self.game_id = Some(id.to_string());
        id
    }
}
