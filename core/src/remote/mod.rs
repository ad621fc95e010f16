//! Remote store boundary
//!
//! The hosted backend (tables + row-level policies) lives outside this crate.
//! `RemoteStore` is the seam: production code plugs in an HTTP client, tests
//! and the shell use `MemoryStore`.

mod error;
mod memory_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::combat::{Combat, CombatId};
use crate::sync::SyncCommand;

pub use error::{RecoveryAction, RemoteError, RemoteErrorKind};
pub use memory_store::MemoryStore;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Apply one command. A repeated `idempotency_key` must not apply twice.
    async fn apply(&self, command: &SyncCommand, idempotency_key: Uuid) -> Result<(), RemoteError>;

    /// Load a combat with its participants in turn order
    async fn fetch_combat(&self, combat_id: CombatId) -> Result<Combat, RemoteError>;
}
