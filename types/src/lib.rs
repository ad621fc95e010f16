//! Shared configuration types for Skirmish
//!
//! This crate contains serializable configuration types that are shared between
//! the tracker core (skirmish-core) and any front end that drives it.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tracker Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Behaviour of the combat tracker itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Seconds per turn applied to newly created combats. None = no turn timer.
    #[serde(default)]
    pub default_turn_timer_secs: Option<u32>,

    /// Count condition durations down at the end of each round and drop
    /// conditions that reach zero.
    #[serde(default)]
    pub expire_conditions: bool,

    /// Advance to the next participant when the turn timer runs out.
    #[serde(default)]
    pub auto_advance_on_timeout: bool,

    /// How often the front end should call `tick` on the tracker.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    250
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            default_turn_timer_secs: None,
            expire_conditions: false,
            auto_advance_on_timeout: false,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Remote store synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Extra attempts for a command that failed with a network error.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Flush the command queue after every tracker command in the shell.
    #[serde(default = "default_auto_flush")]
    pub auto_flush: bool,
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_auto_flush() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            auto_flush: default_auto_flush(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    /// Game the shell creates combats in. Generated on first run when empty.
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}
