use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::participant::CombatParticipant;
use super::{CombatId, ParticipantId};

/// One encounter: its turn pointer, round counter and participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    pub id: CombatId,
    pub game_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub is_paused: bool,
    /// Starts at 1
    pub round: u32,
    /// Index into `participants`
    pub current_turn: usize,
    /// Seconds per turn. None = untimed.
    #[serde(default)]
    pub turn_timer: Option<u32>,
    #[serde(default)]
    pub participants: Vec<CombatParticipant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Combat {
    pub fn new(game_id: Uuid, name: impl Into<String>, turn_timer: Option<u32>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            game_id,
            name: name.into(),
            is_active: false,
            is_paused: false,
            round: 1,
            current_turn: 0,
            turn_timer,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn current_participant(&self) -> Option<&CombatParticipant> {
        self.participants.get(self.current_turn)
    }

    pub fn position_of(&self, participant_id: ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| p.id == participant_id)
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_mut(&mut self, participant_id: ParticipantId) -> Option<&mut CombatParticipant> {
        self.participants.iter_mut().find(|p| p.id == participant_id)
    }

    /// Rewrite every `turn_order` to its array position
    pub fn renumber(&mut self) {
        for (idx, participant) in self.participants.iter_mut().enumerate() {
            participant.turn_order = idx as u32;
        }
    }

    /// `(id, turn_order)` pairs in array order
    pub fn turn_order(&self) -> Vec<(ParticipantId, u32)> {
        self.participants
            .iter()
            .map(|p| (p.id, p.turn_order))
            .collect()
    }
}

/// Combat row without its participants (mirrors the `combats` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRow {
    pub id: CombatId,
    pub game_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub is_paused: bool,
    pub round: u32,
    pub current_turn: usize,
    pub turn_timer: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Combat> for CombatRow {
    fn from(combat: &Combat) -> Self {
        Self {
            id: combat.id,
            game_id: combat.game_id,
            name: combat.name.clone(),
            is_active: combat.is_active,
            is_paused: combat.is_paused,
            round: combat.round,
            current_turn: combat.current_turn,
            turn_timer: combat.turn_timer,
            created_at: combat.created_at,
            updated_at: combat.updated_at,
        }
    }
}

impl CombatRow {
    /// Reassemble a combat from its row and participant rows
    pub fn into_combat(self, mut participants: Vec<CombatParticipant>) -> Combat {
        participants.sort_by_key(|p| p.turn_order);
        Combat {
            id: self.id,
            game_id: self.game_id,
            name: self.name,
            is_active: self.is_active,
            is_paused: self.is_paused,
            round: self.round,
            current_turn: self.current_turn,
            turn_timer: self.turn_timer,
            participants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
