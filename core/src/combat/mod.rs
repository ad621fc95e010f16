//! Combat tracking
//!
//! This module provides:
//! - **Combat**: one encounter with its round counter and turn pointer
//! - **Participants**: ordered combatants with HP, armor class and conditions
//! - **Tracker**: the state container that applies GM actions and records
//!   signals and store commands for each of them

mod condition;
mod error;
mod participant;
mod state;
mod tracker;

#[cfg(test)]
mod tracker_tests;

use uuid::Uuid;

pub type CombatId = Uuid;
pub type ParticipantId = Uuid;

pub use condition::Condition;
pub use error::CombatError;
pub use participant::{
    CombatParticipant, DamageOutcome, HealOutcome, ParticipantKind, ParticipantUpdate,
};
pub use state::{Combat, CombatRow};
pub use tracker::{CombatTracker, TurnChange};
