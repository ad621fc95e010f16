//! Combat participants (player characters and NPCs)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::condition::Condition;
use super::error::CombatError;
use super::{CombatId, ParticipantId};

/// What a participant stands for in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticipantKind {
    /// Backed by a character sheet
    Character { character_id: Uuid, name: String },
    /// Ad-hoc combatant created by the GM
    Npc { npc_name: String },
}

/// One entry in the turn order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatParticipant {
    pub id: ParticipantId,
    pub combat_id: CombatId,
    pub kind: ParticipantKind,
    pub initiative: i32,
    #[serde(default)]
    pub current_hp: Option<i32>,
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub armor_class: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// False hides the participant from players (GM-only)
    pub is_visible: bool,
    /// Position in the turn order, kept equal to the array index
    pub turn_order: u32,
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub previous_hp: i32,
    pub current_hp: i32,
    /// HP went from above zero to zero because of a non-zero hit
    pub downed: bool,
}

/// Result of a heal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealOutcome {
    pub previous_hp: i32,
    pub current_hp: i32,
    /// Came back up from zero
    pub revived: bool,
}

/// Partial update for `CombatTracker::update_participant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantUpdate {
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub current_hp: Option<i32>,
    pub max_hp: Option<i32>,
    pub armor_class: Option<i32>,
    pub is_visible: Option<bool>,
}

impl CombatParticipant {
    fn with_kind(kind: ParticipantKind, initiative: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            combat_id: Uuid::nil(),
            kind,
            initiative,
            current_hp: None,
            max_hp: None,
            armor_class: None,
            conditions: Vec::new(),
            is_visible: true,
            turn_order: 0,
        }
    }

    pub fn npc(name: impl Into<String>, initiative: i32) -> Self {
        Self::with_kind(
            ParticipantKind::Npc {
                npc_name: name.into(),
            },
            initiative,
        )
    }

    /// Track HP; current starts at max. Negative values count as zero.
    pub fn with_hp(mut self, max_hp: i32) -> Self {
        let max_hp = max_hp.max(0);
        self.max_hp = Some(max_hp);
        self.current_hp = Some(max_hp);
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = Some(armor_class);
        self
    }

    /// GM-only participant
    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    pub fn display_name(&self) -> &str {
        match &self.kind {
            ParticipantKind::Character { name, .. } => name,
            ParticipantKind::Npc { npc_name } => npc_name,
        }
    }

    pub fn is_down(&self) -> bool {
        self.current_hp == Some(0)
    }

    /// Subtract `amount` from current HP, clamped at zero.
    pub fn apply_damage(&mut self, amount: u32) -> Result<DamageOutcome, CombatError> {
        let previous_hp = self
            .current_hp
            .ok_or(CombatError::HpNotTracked { participant_id: self.id })?;
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let current_hp = previous_hp.saturating_sub(amount).max(0);
        self.current_hp = Some(current_hp);

        Ok(DamageOutcome {
            previous_hp,
            current_hp,
            downed: amount > 0 && previous_hp > 0 && current_hp == 0,
        })
    }

    /// Add `amount` to current HP, never past max HP (if tracked).
    pub fn heal(&mut self, amount: u32) -> Result<HealOutcome, CombatError> {
        let previous_hp = self
            .current_hp
            .ok_or(CombatError::HpNotTracked { participant_id: self.id })?;
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let mut current_hp = previous_hp.saturating_add(amount);
        if let Some(max) = self.max_hp {
            current_hp = current_hp.min(max);
        }
        self.current_hp = Some(current_hp);

        Ok(HealOutcome {
            previous_hp,
            current_hp,
            revived: previous_hp <= 0 && current_hp > 0,
        })
    }

    /// Attach a condition. A condition with the same name is replaced and returned.
    pub fn add_condition(&mut self, condition: Condition) -> Option<Condition> {
        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.is_named(&condition.name))
        {
            return Some(std::mem::replace(existing, condition));
        }
        self.conditions.push(condition);
        None
    }

    pub fn remove_condition(&mut self, name: &str) -> Option<Condition> {
        let idx = self.conditions.iter().position(|c| c.is_named(name))?;
        Some(self.conditions.remove(idx))
    }

    /// Replace the condition called `name`. A rename may not collide with
    /// another condition the participant already has.
    pub fn update_condition(&mut self, name: &str, condition: Condition) -> Result<(), CombatError> {
        let idx = self
            .conditions
            .iter()
            .position(|c| c.is_named(name))
            .ok_or_else(|| CombatError::ConditionNotFound {
                participant_id: self.id,
                name: name.to_string(),
            })?;
        let collides = self
            .conditions
            .iter()
            .enumerate()
            .any(|(i, c)| i != idx && c.is_named(&condition.name));
        if collides {
            return Err(CombatError::DuplicateCondition {
                participant_id: self.id,
                name: condition.name,
            });
        }
        self.conditions[idx] = condition;
        Ok(())
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c.is_named(name))
    }

    /// Count every timed condition down one round, removing the ones that ran out.
    pub fn expire_conditions(&mut self) -> Vec<Condition> {
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.conditions.len());
        for mut condition in self.conditions.drain(..) {
            if condition.tick_round() {
                expired.push(condition);
            } else {
                kept.push(condition);
            }
        }
        self.conditions = kept;
        expired
    }

    /// Apply a partial update. HP ends up within `0..=max_hp`; a negative
    /// max is refused before anything changes.
    pub(crate) fn apply_update(&mut self, update: ParticipantUpdate) -> Result<(), CombatError> {
        if let Some(max_hp) = update.max_hp.filter(|max| *max < 0) {
            return Err(CombatError::InvalidHitPoints {
                participant_id: self.id,
                value: max_hp,
            });
        }
        if let Some(name) = update.name {
            match &mut self.kind {
                ParticipantKind::Character { name: n, .. } => *n = name,
                ParticipantKind::Npc { npc_name } => *npc_name = name,
            }
        }
        if let Some(initiative) = update.initiative {
            self.initiative = initiative;
        }
        if let Some(max_hp) = update.max_hp {
            self.max_hp = Some(max_hp);
        }
        if let Some(current_hp) = update.current_hp {
            self.current_hp = Some(current_hp.max(0));
        }
        if let (Some(current), Some(max)) = (self.current_hp, self.max_hp) {
            self.current_hp = Some(current.min(max));
        }
        if let Some(armor_class) = update.armor_class {
            self.armor_class = Some(armor_class);
        }
        if let Some(is_visible) = update.is_visible {
            self.is_visible = is_visible;
        }
        Ok(())
    }
}
