//! Error types for combat tracker operations

use thiserror::Error;

use super::ParticipantId;

/// Errors returned by `CombatTracker` operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("no combat loaded")]
    NoCombat,

    #[error("a combat is already running")]
    AlreadyActive,

    #[error("combat is not running")]
    NotActive,

    #[error("combat is already paused")]
    AlreadyPaused,

    #[error("combat is not paused")]
    NotPaused,

    #[error("turn order is empty")]
    EmptyTurnOrder,

    #[error("participant {participant_id} not found")]
    ParticipantNotFound { participant_id: ParticipantId },

    #[error("participant {participant_id} has no hit points tracked")]
    HpNotTracked { participant_id: ParticipantId },

    #[error("participant {participant_id} has no condition named '{name}'")]
    ConditionNotFound {
        participant_id: ParticipantId,
        name: String,
    },

    #[error("participant {participant_id} already has a condition named '{name}'")]
    DuplicateCondition {
        participant_id: ParticipantId,
        name: String,
    },

    #[error("participant {participant_id}: hit points cannot be {value}")]
    InvalidHitPoints {
        participant_id: ParticipantId,
        value: i32,
    },

    #[error("position {index} is out of range (turn order has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}
