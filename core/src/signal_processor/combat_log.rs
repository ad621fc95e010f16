//! Human-readable combat history built from signals

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::handler::SignalHandler;
use super::signal::CombatSignal;
use crate::combat::{Combat, ParticipantId};

const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub round: u32,
    pub text: String,
}

/// Keeps the most recent entries, oldest first.
#[derive(Debug)]
pub struct CombatLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    written: u64,
}

impl Default for CombatLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl CombatLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            written: 0,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written since the log was created, including evicted ones
    pub fn total_written(&self) -> u64 {
        self.written
    }

    /// Entries written after `total_written` returned `mark`, if still held
    pub fn since(&self, mark: u64) -> impl Iterator<Item = &LogEntry> {
        let added = usize::try_from(self.written.saturating_sub(mark)).unwrap_or(usize::MAX);
        self.entries
            .iter()
            .skip(self.entries.len().saturating_sub(added))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, round: u32, text: String) {
        self.entries.push_back(LogEntry {
            at: Utc::now(),
            round,
            text,
        });
        self.written += 1;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

fn name_of(combat: Option<&Combat>, id: ParticipantId) -> String {
    combat
        .and_then(|c| c.participant(id))
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| id.to_string())
}

impl SignalHandler for CombatLog {
    fn handle_signal(&mut self, signal: &CombatSignal, combat: Option<&Combat>) {
        let round = match signal {
            CombatSignal::RoundStarted { round }
            | CombatSignal::TurnChanged { round, .. }
            | CombatSignal::TurnTimerExpired { round, .. } => *round,
            _ => combat.map(|c| c.round).unwrap_or(1),
        };
        let text = match signal {
            CombatSignal::CombatStarted { .. } => "Combat started".to_string(),
            CombatSignal::CombatPaused { .. } => "Combat paused".to_string(),
            CombatSignal::CombatResumed { .. } => "Combat resumed".to_string(),
            CombatSignal::CombatEnded { rounds, .. } => {
                format!("Combat ended after {rounds} round(s)")
            }
            CombatSignal::RoundStarted { round } => format!("Round {round} begins"),
            CombatSignal::TurnChanged {
                participant_id: Some(id),
                ..
            } => format!("{}'s turn", name_of(combat, *id)),
            CombatSignal::TurnChanged { .. } | CombatSignal::TurnOrderChanged { .. } => return,
            CombatSignal::TurnTimerExpired { participant_id, .. } => match participant_id {
                Some(id) => format!("Time is up for {}", name_of(combat, *id)),
                None => "Turn timer expired".to_string(),
            },
            CombatSignal::ParticipantAdded { name, .. } => format!("{name} joins the fight"),
            CombatSignal::ParticipantRemoved { name, .. } => format!("{name} leaves the fight"),
            CombatSignal::ParticipantUpdated { .. } => return,
            CombatSignal::DamageDealt {
                participant_id,
                amount,
                current_hp,
            } => format!(
                "{} takes {amount} damage ({current_hp} HP left)",
                name_of(combat, *participant_id)
            ),
            CombatSignal::ParticipantDowned { participant_id } => {
                format!("{} is down", name_of(combat, *participant_id))
            }
            CombatSignal::Healed {
                participant_id,
                amount,
                current_hp,
            } => format!(
                "{} heals {amount} ({current_hp} HP)",
                name_of(combat, *participant_id)
            ),
            CombatSignal::ConditionApplied {
                participant_id,
                condition,
            } => format!(
                "{} is {}",
                name_of(combat, *participant_id),
                condition.name
            ),
            CombatSignal::ConditionRemoved {
                participant_id,
                name,
            } => format!("{} is no longer {name}", name_of(combat, *participant_id)),
            CombatSignal::ConditionExpired {
                participant_id,
                name,
            } => format!("{name} wore off {}", name_of(combat, *participant_id)),
        };
        self.push(round, text);
    }
}
