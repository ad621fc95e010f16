//! Status conditions attached to participants

use serde::{Deserialize, Serialize};

/// A named status effect (Poisoned, Prone, Blessed, ...)
///
/// `duration_rounds` counts down only when the tracker runs with
/// `expire_conditions` enabled; otherwise it is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Remaining rounds. None = lasts until removed.
    #[serde(default)]
    pub duration_rounds: Option<u32>,
    /// Who or what applied it (spell name, attacker)
    #[serde(default)]
    pub source: Option<String>,
}

impl Condition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            duration_rounds: None,
            source: None,
        }
    }

    pub fn with_duration(mut self, rounds: u32) -> Self {
        self.duration_rounds = Some(rounds);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Case-insensitive name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Count down one round. Returns true once the condition has run out.
    pub fn tick_round(&mut self) -> bool {
        match self.duration_rounds.as_mut() {
            Some(rounds) => {
                *rounds = rounds.saturating_sub(1);
                *rounds == 0
            }
            None => false,
        }
    }
}
