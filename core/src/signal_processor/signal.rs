use crate::combat::{CombatId, Condition, ParticipantId};

/// Signals emitted by the CombatTracker for cross-cutting concerns.
/// These describe what happened at the level a GM cares about, after the
/// tracker has applied the change.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatSignal {
    // Combat lifecycle
    CombatStarted {
        combat_id: CombatId,
    },
    CombatPaused {
        combat_id: CombatId,
    },
    CombatResumed {
        combat_id: CombatId,
    },
    CombatEnded {
        combat_id: CombatId,
        rounds: u32,
    },

    // Turn order
    TurnChanged {
        round: u32,
        current_turn: usize,
        participant_id: Option<ParticipantId>,
    },
    RoundStarted {
        round: u32,
    },
    TurnOrderChanged {
        combat_id: CombatId,
    },
    TurnTimerExpired {
        round: u32,
        participant_id: Option<ParticipantId>,
    },

    // Participants
    ParticipantAdded {
        participant_id: ParticipantId,
        name: String,
    },
    ParticipantRemoved {
        participant_id: ParticipantId,
        name: String,
    },
    ParticipantUpdated {
        participant_id: ParticipantId,
    },
    DamageDealt {
        participant_id: ParticipantId,
        amount: u32,
        current_hp: i32,
    },
    /// HP dropped to zero from a non-zero hit
    ParticipantDowned {
        participant_id: ParticipantId,
    },
    Healed {
        participant_id: ParticipantId,
        amount: u32,
        current_hp: i32,
    },

    // Conditions
    ConditionApplied {
        participant_id: ParticipantId,
        condition: Condition,
    },
    ConditionRemoved {
        participant_id: ParticipantId,
        name: String,
    },
    ConditionExpired {
        participant_id: ParticipantId,
        name: String,
    },
}
