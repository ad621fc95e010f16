//! In-process implementation of `RemoteStore`

use std::collections::VecDeque;

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RemoteError, RemoteStore};
use crate::combat::{Combat, CombatId, CombatParticipant, CombatRow, ParticipantId};
use crate::sync::SyncCommand;

#[derive(Debug, Default)]
struct Tables {
    combats: HashMap<CombatId, CombatRow>,
    participants: HashMap<ParticipantId, CombatParticipant>,
    /// Every key ever applied. Never pruned, so a replay of any old command
    /// is still ignored; fine for a store that lives as long as one session.
    applied_keys: HashSet<Uuid>,
}

/// Holds `combats` and `combat_participants` rows in memory.
///
/// Failures can be queued with `fail_next`; each queued error is returned by
/// one `apply` call before any write happens. Idempotency keys are kept for
/// the life of the store, so memory grows with the number of commands applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    injected: Mutex<VecDeque<RemoteError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next(&self, error: RemoteError) {
        self.injected.lock().await.push_back(error);
    }

    pub async fn combat_count(&self) -> usize {
        self.tables.lock().await.combats.len()
    }

    pub async fn participant_count(&self, combat_id: CombatId) -> usize {
        self.tables
            .lock()
            .await
            .participants
            .values()
            .filter(|p| p.combat_id == combat_id)
            .count()
    }

    pub async fn applied_count(&self) -> usize {
        self.tables.lock().await.applied_keys.len()
    }
}

impl Tables {
    fn apply(&mut self, command: &SyncCommand) -> Result<(), RemoteError> {
        match command {
            SyncCommand::UpsertCombat { combat } => {
                self.combats.insert(combat.id, combat.clone());
            }
            SyncCommand::UpsertParticipant { participant } => {
                if !self.combats.contains_key(&participant.combat_id) {
                    return Err(RemoteError::from_response(
                        Some("23503"),
                        format!("combat {} does not exist", participant.combat_id),
                    ));
                }
                self.participants.insert(participant.id, participant.clone());
            }
            SyncCommand::DeleteParticipant { participant_id, .. } => {
                self.participants
                    .remove(participant_id)
                    .ok_or_else(|| RemoteError::not_found(format!("participant {participant_id}")))?;
            }
            SyncCommand::ReorderParticipants { order, .. } => {
                if let Some((missing, _)) = order
                    .iter()
                    .find(|(id, _)| !self.participants.contains_key(id))
                {
                    return Err(RemoteError::not_found(format!("participant {missing}")));
                }
                for (id, turn_order) in order {
                    if let Some(row) = self.participants.get_mut(id) {
                        row.turn_order = *turn_order;
                    }
                }
            }
            SyncCommand::EndCombat { combat_id } => {
                let row = self
                    .combats
                    .get_mut(combat_id)
                    .ok_or_else(|| RemoteError::not_found(format!("combat {combat_id}")))?;
                row.is_active = false;
                row.is_paused = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn apply(&self, command: &SyncCommand, idempotency_key: Uuid) -> Result<(), RemoteError> {
        if let Some(error) = self.injected.lock().await.pop_front() {
            return Err(error);
        }

        let mut tables = self.tables.lock().await;
        if tables.applied_keys.contains(&idempotency_key) {
            tracing::debug!(%idempotency_key, "Duplicate command ignored");
            return Ok(());
        }
        tables.apply(command)?;
        tables.applied_keys.insert(idempotency_key);
        Ok(())
    }

    async fn fetch_combat(&self, combat_id: CombatId) -> Result<Combat, RemoteError> {
        let tables = self.tables.lock().await;
        let row = tables
            .combats
            .get(&combat_id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("combat {combat_id}")))?;
        let participants = tables
            .participants
            .values()
            .filter(|p| p.combat_id == combat_id)
            .cloned()
            .collect();
        Ok(row.into_combat(participants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Combat;
    use crate::remote::RemoteErrorKind;

    fn combat() -> Combat {
        Combat::new(Uuid::new_v4(), "Bridge Fight", None)
    }

    #[tokio::test]
    async fn participant_requires_existing_combat() {
        let store = MemoryStore::new();
        let mut p = CombatParticipant::npc("Troll", 8);
        p.combat_id = Uuid::new_v4();

        let err = store
            .apply(&SyncCommand::UpsertParticipant { participant: p }, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Other);
    }

    #[tokio::test]
    async fn same_key_applies_once() {
        let store = MemoryStore::new();
        let c = combat();
        let cmd = SyncCommand::UpsertCombat {
            combat: CombatRow::from(&c),
        };
        let key = Uuid::new_v4();

        store.apply(&cmd, key).await.unwrap();
        store.apply(&cmd, key).await.unwrap();
        assert_eq!(store.applied_count().await, 1);
        assert_eq!(store.combat_count().await, 1);
    }

    #[tokio::test]
    async fn fetch_returns_participants_in_turn_order() {
        let store = MemoryStore::new();
        let c = combat();
        store
            .apply(
                &SyncCommand::UpsertCombat {
                    combat: CombatRow::from(&c),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        for (name, order) in [("Second", 1), ("First", 0)] {
            let mut p = CombatParticipant::npc(name, 10);
            p.combat_id = c.id;
            p.turn_order = order;
            store
                .apply(&SyncCommand::UpsertParticipant { participant: p }, Uuid::new_v4())
                .await
                .unwrap();
        }

        let fetched = store.fetch_combat(c.id).await.unwrap();
        let names: Vec<_> = fetched
            .participants
            .iter()
            .map(|p| p.display_name())
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn old_keys_stay_deduplicated() {
        let store = MemoryStore::new();
        let c = combat();
        let upsert = SyncCommand::UpsertCombat {
            combat: CombatRow::from(&c),
        };
        store.apply(&upsert, Uuid::new_v4()).await.unwrap();

        let mut p = CombatParticipant::npc("Troll", 8);
        p.combat_id = c.id;
        let delete = SyncCommand::DeleteParticipant {
            combat_id: c.id,
            participant_id: p.id,
        };
        store
            .apply(&SyncCommand::UpsertParticipant { participant: p }, Uuid::new_v4())
            .await
            .unwrap();
        let delete_key = Uuid::new_v4();
        store.apply(&delete, delete_key).await.unwrap();
        for _ in 0..5 {
            store.apply(&upsert, Uuid::new_v4()).await.unwrap();
        }

        // Replaying the delete would be NotFound if it reached the tables
        store.apply(&delete, delete_key).await.unwrap();
        assert_eq!(store.participant_count(c.id).await, 0);
        assert_eq!(store.applied_count().await, 8);
    }

    #[tokio::test]
    async fn injected_failure_is_returned_once() {
        let store = MemoryStore::new();
        store.fail_next(RemoteError::network("offline")).await;
        let c = combat();
        let cmd = SyncCommand::UpsertCombat {
            combat: CombatRow::from(&c),
        };

        assert!(store.apply(&cmd, Uuid::new_v4()).await.is_err());
        assert!(store.apply(&cmd, Uuid::new_v4()).await.is_ok());
    }
}
