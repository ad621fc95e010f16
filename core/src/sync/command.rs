//! Commands sent to the remote store
//!
//! Each tracker mutation is recorded as one command whose payload mirrors
//! the relational rows (`combats`, `combat_participants`).

use serde::{Deserialize, Serialize};

use crate::combat::{CombatId, CombatParticipant, CombatRow, ParticipantId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncCommand {
    UpsertCombat {
        combat: CombatRow,
    },
    UpsertParticipant {
        participant: CombatParticipant,
    },
    DeleteParticipant {
        combat_id: CombatId,
        participant_id: ParticipantId,
    },
    /// Full turn order after a drag-and-drop or initiative sort
    ReorderParticipants {
        combat_id: CombatId,
        order: Vec<(ParticipantId, u32)>,
    },
    EndCombat {
        combat_id: CombatId,
    },
}

impl SyncCommand {
    pub fn table(&self) -> &'static str {
        match self {
            SyncCommand::UpsertCombat { .. } | SyncCommand::EndCombat { .. } => "combats",
            SyncCommand::UpsertParticipant { .. }
            | SyncCommand::DeleteParticipant { .. }
            | SyncCommand::ReorderParticipants { .. } => "combat_participants",
        }
    }

    /// Short label for logs and status output
    pub fn describe(&self) -> String {
        match self {
            SyncCommand::UpsertCombat { combat } => format!("upsert combat '{}'", combat.name),
            SyncCommand::UpsertParticipant { participant } => {
                format!("upsert participant '{}'", participant.display_name())
            }
            SyncCommand::DeleteParticipant { participant_id, .. } => {
                format!("delete participant {participant_id}")
            }
            SyncCommand::ReorderParticipants { order, .. } => {
                format!("reorder {} participants", order.len())
            }
            SyncCommand::EndCombat { combat_id } => format!("end combat {combat_id}"),
        }
    }

    /// Wire payload, one JSON object tagged by `op`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
