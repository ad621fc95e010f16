//! Combat state container
//!
//! `CombatTracker` owns one combat, its turn timer and two outboxes:
//! - **signals** describing what changed, for logs and front ends
//! - **commands** to replay against the remote store
//!
//! Every operation mutates local state first and records the matching
//! command. Nothing here talks to the store; see `crate::sync`.

use std::time::{Duration, Instant};

use skirmish_types::TrackerSettings;
use uuid::Uuid;

use super::condition::Condition;
use super::error::CombatError;
use super::participant::{CombatParticipant, DamageOutcome, HealOutcome, ParticipantUpdate};
use super::state::{Combat, CombatRow};
use super::{CombatId, ParticipantId};
use crate::signal_processor::CombatSignal;
use crate::sync::SyncCommand;
use crate::timers::{TimerEvent, TurnTimer};

/// Where the turn pointer ended up after `next_turn` / `previous_turn`
#[derive(Debug, Clone, PartialEq)]
pub struct TurnChange {
    pub round: u32,
    pub current_turn: usize,
    pub participant_id: Option<ParticipantId>,
    pub new_round: bool,
    /// Conditions that ran out at the round boundary
    pub expired_conditions: Vec<(ParticipantId, Condition)>,
}

#[derive(Debug)]
pub struct CombatTracker {
    settings: TrackerSettings,
    combat: Option<Combat>,
    timer: TurnTimer,
    signals: Vec<CombatSignal>,
    commands: Vec<SyncCommand>,
}

fn upsert_combat(combat: &Combat) -> SyncCommand {
    SyncCommand::UpsertCombat {
        combat: CombatRow::from(combat),
    }
}

fn secs(value: Option<u32>) -> Duration {
    Duration::from_secs(u64::from(value.unwrap_or(0)))
}

impl CombatTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            combat: None,
            timer: TurnTimer::new(Duration::ZERO),
            signals: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TrackerSettings) {
        self.settings = settings;
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Create a fresh, not yet started combat. Replaces an ended one.
    pub fn create_combat(
        &mut self,
        game_id: Uuid,
        name: impl Into<String>,
        turn_timer: Option<u32>,
    ) -> Result<CombatId, CombatError> {
        if self.combat.as_ref().is_some_and(|c| c.is_active) {
            return Err(CombatError::AlreadyActive);
        }

        let turn_timer = turn_timer.or(self.settings.default_turn_timer_secs);
        let combat = Combat::new(game_id, name, turn_timer);
        let id = combat.id;

        tracing::info!(combat_id = %id, name = %combat.name, ?turn_timer, "Combat created");
        self.timer = TurnTimer::new(secs(turn_timer));
        self.commands.push(upsert_combat(&combat));
        self.combat = Some(combat);
        Ok(id)
    }

    /// Adopt a combat fetched from the store. Records no commands.
    pub fn load_combat(&mut self, combat: Combat, now: Instant) {
        self.timer = TurnTimer::new(secs(combat.turn_timer));
        if combat.is_active && combat.turn_timer.is_some() {
            self.timer.start(now);
            if combat.is_paused {
                self.timer.pause(now);
            }
        }
        tracing::info!(combat_id = %combat.id, "Combat loaded");
        self.combat = Some(combat);
    }

    pub fn start(&mut self, now: Instant) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if combat.is_active {
            return Err(CombatError::AlreadyActive);
        }
        if combat.participants.is_empty() {
            return Err(CombatError::EmptyTurnOrder);
        }

        combat.is_active = true;
        combat.is_paused = false;
        combat.round = 1;
        combat.current_turn = 0;
        combat.touch();

        if combat.turn_timer.is_some() {
            self.timer.set_duration(secs(combat.turn_timer));
            self.timer.start(now);
        } else {
            self.timer.reset();
        }

        tracing::info!(
            combat_id = %combat.id,
            participants = combat.participants.len(),
            "Combat started"
        );
        self.signals.push(CombatSignal::CombatStarted {
            combat_id: combat.id,
        });
        self.signals.push(CombatSignal::TurnChanged {
            round: combat.round,
            current_turn: combat.current_turn,
            participant_id: combat.current_participant().map(|p| p.id),
        });
        self.commands.push(upsert_combat(combat));
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if !combat.is_active {
            return Err(CombatError::NotActive);
        }
        if combat.is_paused {
            return Err(CombatError::AlreadyPaused);
        }

        combat.is_paused = true;
        combat.touch();
        self.timer.pause(now);

        self.signals.push(CombatSignal::CombatPaused {
            combat_id: combat.id,
        });
        self.commands.push(upsert_combat(combat));
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if !combat.is_active {
            return Err(CombatError::NotActive);
        }
        if !combat.is_paused {
            return Err(CombatError::NotPaused);
        }

        combat.is_paused = false;
        combat.touch();
        self.timer.resume(now);

        self.signals.push(CombatSignal::CombatResumed {
            combat_id: combat.id,
        });
        self.commands.push(upsert_combat(combat));
        Ok(())
    }

    /// Mark the combat inactive and stop its timer.
    pub fn end(&mut self) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if !combat.is_active {
            return Err(CombatError::NotActive);
        }

        combat.is_active = false;
        combat.is_paused = false;
        combat.touch();
        self.timer.reset();

        tracing::info!(combat_id = %combat.id, rounds = combat.round, "Combat ended");
        self.signals.push(CombatSignal::CombatEnded {
            combat_id: combat.id,
            rounds: combat.round,
        });
        self.commands.push(SyncCommand::EndCombat {
            combat_id: combat.id,
        });
        Ok(())
    }

    // ─── Turn order ─────────────────────────────────────────────────────────

    pub fn next_turn(&mut self, now: Instant) -> Result<TurnChange, CombatError> {
        let expire = self.settings.expire_conditions;
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if !combat.is_active {
            return Err(CombatError::NotActive);
        }
        let len = combat.participants.len();
        if len == 0 {
            return Err(CombatError::EmptyTurnOrder);
        }

        let new_round = combat.current_turn + 1 >= len;
        combat.current_turn = (combat.current_turn + 1) % len;

        let mut expired_conditions = Vec::new();
        if new_round {
            combat.round += 1;
            self.signals.push(CombatSignal::RoundStarted {
                round: combat.round,
            });

            if expire {
                for participant in &mut combat.participants {
                    let expired = participant.expire_conditions();
                    if expired.is_empty() {
                        continue;
                    }
                    for condition in expired {
                        self.signals.push(CombatSignal::ConditionExpired {
                            participant_id: participant.id,
                            name: condition.name.clone(),
                        });
                        expired_conditions.push((participant.id, condition));
                    }
                    self.commands.push(SyncCommand::UpsertParticipant {
                        participant: participant.clone(),
                    });
                }
            }
        }
        combat.touch();

        let change = TurnChange {
            round: combat.round,
            current_turn: combat.current_turn,
            participant_id: combat.current_participant().map(|p| p.id),
            new_round,
            expired_conditions,
        };
        tracing::debug!(
            round = change.round,
            current_turn = change.current_turn,
            "Turn advanced"
        );

        self.signals.push(CombatSignal::TurnChanged {
            round: change.round,
            current_turn: change.current_turn,
            participant_id: change.participant_id,
        });
        self.commands.push(upsert_combat(combat));
        self.restart_timer(now);
        Ok(change)
    }

    /// Step back one turn. Wrapping from the first participant goes back a
    /// round, never below round 1.
    pub fn previous_turn(&mut self, now: Instant) -> Result<TurnChange, CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        if !combat.is_active {
            return Err(CombatError::NotActive);
        }
        let len = combat.participants.len();
        if len == 0 {
            return Err(CombatError::EmptyTurnOrder);
        }

        if combat.current_turn == 0 || combat.current_turn >= len {
            combat.current_turn = len - 1;
            combat.round = combat.round.saturating_sub(1).max(1);
        } else {
            combat.current_turn -= 1;
        }
        combat.touch();

        let change = TurnChange {
            round: combat.round,
            current_turn: combat.current_turn,
            participant_id: combat.current_participant().map(|p| p.id),
            new_round: false,
            expired_conditions: Vec::new(),
        };
        tracing::debug!(
            round = change.round,
            current_turn = change.current_turn,
            "Turn rewound"
        );

        self.signals.push(CombatSignal::TurnChanged {
            round: change.round,
            current_turn: change.current_turn,
            participant_id: change.participant_id,
        });
        self.commands.push(upsert_combat(combat));
        self.restart_timer(now);
        Ok(change)
    }

    /// Move the participant at `from` to `to`, renumbering the whole order.
    /// The turn pointer stays on whoever is acting.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        let len = combat.participants.len();
        for index in [from, to] {
            if index >= len {
                return Err(CombatError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }

        let acting = combat.current_participant().map(|p| p.id);
        let moved = combat.participants.remove(from);
        combat.participants.insert(to, moved);
        Self::finish_reorder(combat, acting, &mut self.signals, &mut self.commands);
        Ok(())
    }

    /// Stable sort by initiative, highest first.
    pub fn sort_by_initiative(&mut self) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        let acting = combat.current_participant().map(|p| p.id);
        combat
            .participants
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
        Self::finish_reorder(combat, acting, &mut self.signals, &mut self.commands);
        Ok(())
    }

    fn finish_reorder(
        combat: &mut Combat,
        acting: Option<ParticipantId>,
        signals: &mut Vec<CombatSignal>,
        commands: &mut Vec<SyncCommand>,
    ) {
        combat.renumber();
        let previous_turn = combat.current_turn;
        if let Some(idx) = acting.and_then(|id| combat.position_of(id)) {
            combat.current_turn = idx;
        }
        combat.touch();

        signals.push(CombatSignal::TurnOrderChanged {
            combat_id: combat.id,
        });
        commands.push(SyncCommand::ReorderParticipants {
            combat_id: combat.id,
            order: combat.turn_order(),
        });
        if combat.current_turn != previous_turn {
            commands.push(upsert_combat(combat));
        }
    }

    // ─── Participants ───────────────────────────────────────────────────────

    /// Append a participant to the end of the turn order.
    pub fn add_participant(
        &mut self,
        mut participant: CombatParticipant,
    ) -> Result<ParticipantId, CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        participant.combat_id = combat.id;
        participant.turn_order = combat.participants.len() as u32;
        let id = participant.id;

        tracing::debug!(participant_id = %id, name = participant.display_name(), "Participant added");
        self.signals.push(CombatSignal::ParticipantAdded {
            participant_id: id,
            name: participant.display_name().to_string(),
        });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: participant.clone(),
        });
        combat.participants.push(participant);
        combat.touch();
        Ok(id)
    }

    pub fn update_participant(
        &mut self,
        participant_id: ParticipantId,
        update: ParticipantUpdate,
    ) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        let participant = combat
            .participant_mut(participant_id)
            .ok_or(CombatError::ParticipantNotFound { participant_id })?;
        participant.apply_update(update)?;

        self.signals
            .push(CombatSignal::ParticipantUpdated { participant_id });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: participant.clone(),
        });
        Ok(())
    }

    /// Take a participant out of the turn order. The turn pointer follows the
    /// acting participant; removing the acting one hands the turn to the next
    /// and restarts the turn timer for them.
    pub fn remove_participant(
        &mut self,
        participant_id: ParticipantId,
        now: Instant,
    ) -> Result<CombatParticipant, CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        let idx = combat
            .position_of(participant_id)
            .ok_or(CombatError::ParticipantNotFound { participant_id })?;

        let removed = combat.participants.remove(idx);
        let remaining = combat.participants.len();
        let previous_turn = combat.current_turn;
        if idx < combat.current_turn {
            combat.current_turn -= 1;
        } else if combat.current_turn >= remaining {
            combat.current_turn = 0;
        }
        combat.renumber();
        combat.touch();

        tracing::debug!(participant_id = %participant_id, "Participant removed");
        self.signals.push(CombatSignal::ParticipantRemoved {
            participant_id,
            name: removed.display_name().to_string(),
        });
        self.commands.push(SyncCommand::DeleteParticipant {
            combat_id: combat.id,
            participant_id,
        });
        if idx < remaining {
            self.commands.push(SyncCommand::ReorderParticipants {
                combat_id: combat.id,
                order: combat.turn_order(),
            });
        }
        if combat.current_turn != previous_turn {
            self.commands.push(upsert_combat(combat));
        }

        let was_acting = idx == previous_turn;
        if was_acting && combat.is_active {
            if remaining == 0 {
                self.timer.reset();
            } else {
                self.signals.push(CombatSignal::TurnChanged {
                    round: combat.round,
                    current_turn: combat.current_turn,
                    participant_id: combat.current_participant().map(|p| p.id),
                });
                self.restart_timer(now);
            }
        }
        Ok(removed)
    }

    pub fn deal_damage(
        &mut self,
        participant_id: ParticipantId,
        amount: u32,
    ) -> Result<DamageOutcome, CombatError> {
        let participant = self.participant_mut(participant_id)?;
        let outcome = participant.apply_damage(amount)?;
        let snapshot = participant.clone();

        tracing::debug!(
            participant_id = %participant_id,
            amount,
            current_hp = outcome.current_hp,
            "Damage dealt"
        );
        self.signals.push(CombatSignal::DamageDealt {
            participant_id,
            amount,
            current_hp: outcome.current_hp,
        });
        if outcome.downed {
            self.signals
                .push(CombatSignal::ParticipantDowned { participant_id });
        }
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: snapshot,
        });
        Ok(outcome)
    }

    pub fn heal(
        &mut self,
        participant_id: ParticipantId,
        amount: u32,
    ) -> Result<HealOutcome, CombatError> {
        let participant = self.participant_mut(participant_id)?;
        let outcome = participant.heal(amount)?;
        let snapshot = participant.clone();

        self.signals.push(CombatSignal::Healed {
            participant_id,
            amount,
            current_hp: outcome.current_hp,
        });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: snapshot,
        });
        Ok(outcome)
    }

    // ─── Conditions ─────────────────────────────────────────────────────────

    /// Attach a condition; returns the one it replaced, if any.
    pub fn add_condition(
        &mut self,
        participant_id: ParticipantId,
        condition: Condition,
    ) -> Result<Option<Condition>, CombatError> {
        let participant = self.participant_mut(participant_id)?;
        let replaced = participant.add_condition(condition.clone());
        let snapshot = participant.clone();

        self.signals.push(CombatSignal::ConditionApplied {
            participant_id,
            condition,
        });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: snapshot,
        });
        Ok(replaced)
    }

    pub fn remove_condition(
        &mut self,
        participant_id: ParticipantId,
        name: &str,
    ) -> Result<Condition, CombatError> {
        let participant = self.participant_mut(participant_id)?;
        let removed =
            participant
                .remove_condition(name)
                .ok_or_else(|| CombatError::ConditionNotFound {
                    participant_id,
                    name: name.to_string(),
                })?;
        let snapshot = participant.clone();

        self.signals.push(CombatSignal::ConditionRemoved {
            participant_id,
            name: removed.name.clone(),
        });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: snapshot,
        });
        Ok(removed)
    }

    pub fn update_condition(
        &mut self,
        participant_id: ParticipantId,
        name: &str,
        condition: Condition,
    ) -> Result<(), CombatError> {
        let participant = self.participant_mut(participant_id)?;
        participant.update_condition(name, condition)?;
        let snapshot = participant.clone();

        self.signals
            .push(CombatSignal::ParticipantUpdated { participant_id });
        self.commands.push(SyncCommand::UpsertParticipant {
            participant: snapshot,
        });
        Ok(())
    }

    // ─── Timer ──────────────────────────────────────────────────────────────

    /// Drive the turn timer. Call this from the embedding loop.
    ///
    /// Expiry is reported once per turn as `CombatSignal::TurnTimerExpired`.
    /// The turn only advances on expiry when `auto_advance_on_timeout` is set.
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        let combat = self.combat.as_ref().filter(|c| c.is_active)?;
        let event = self.timer.tick(now)?;

        let participant_id = combat.current_participant().map(|p| p.id);
        tracing::info!(round = combat.round, ?participant_id, "Turn timer expired");
        self.signals.push(CombatSignal::TurnTimerExpired {
            round: combat.round,
            participant_id,
        });

        if self.settings.auto_advance_on_timeout
            && let Err(e) = self.next_turn(now)
        {
            tracing::warn!(error = %e, "Failed to advance turn after timeout");
        }
        Some(event)
    }

    /// Change seconds-per-turn. A running countdown restarts with the new value.
    pub fn set_turn_timer(&mut self, turn_timer: Option<u32>, now: Instant) -> Result<(), CombatError> {
        let combat = self.combat.as_mut().ok_or(CombatError::NoCombat)?;
        combat.turn_timer = turn_timer;
        combat.touch();
        self.commands.push(upsert_combat(combat));
        self.timer.set_duration(secs(turn_timer));
        self.restart_timer(now);
        Ok(())
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    fn restart_timer(&mut self, now: Instant) {
        let Some(combat) = self.combat.as_ref().filter(|c| c.is_active) else {
            return;
        };
        if combat.turn_timer.is_none() {
            self.timer.reset();
            return;
        }
        self.timer.start(now);
        if combat.is_paused {
            self.timer.pause(now);
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn combat(&self) -> Option<&Combat> {
        self.combat.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.combat.as_ref().is_some_and(|c| c.is_active)
    }

    pub fn current_participant(&self) -> Option<&CombatParticipant> {
        self.combat.as_ref()?.current_participant()
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&CombatParticipant> {
        self.combat.as_ref()?.participant(participant_id)
    }

    pub fn participant_at(&self, index: usize) -> Option<&CombatParticipant> {
        self.combat.as_ref()?.participants.get(index)
    }

    /// Participants a viewer may see; players never see hidden ones.
    pub fn visible_participants(&self, is_game_master: bool) -> Vec<&CombatParticipant> {
        self.combat
            .iter()
            .flat_map(|c| c.participants.iter())
            .filter(|p| is_game_master || p.is_visible)
            .collect()
    }

    fn participant_mut(
        &mut self,
        participant_id: ParticipantId,
    ) -> Result<&mut CombatParticipant, CombatError> {
        self.combat
            .as_mut()
            .ok_or(CombatError::NoCombat)?
            .participant_mut(participant_id)
            .ok_or(CombatError::ParticipantNotFound { participant_id })
    }

    /// Take all signals recorded since the last call
    pub fn drain_signals(&mut self) -> Vec<CombatSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Take all store commands recorded since the last call
    pub fn drain_commands(&mut self) -> Vec<SyncCommand> {
        std::mem::take(&mut self.commands)
    }
}
