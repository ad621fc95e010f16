mod config;
mod error;

pub use config::{AppConfig, AppConfigExt, SyncSettings, TrackerSettings};
pub use error::ConfigError;
