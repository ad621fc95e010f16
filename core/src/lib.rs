pub mod combat;
pub mod context;
pub mod records;
pub mod remote;
pub mod signal_processor;
pub mod sync;
pub mod timers;

// Re-exports for convenience
pub use combat::{
    Combat, CombatError, CombatId, CombatParticipant, CombatTracker, Condition, DamageOutcome,
    HealOutcome, ParticipantId, ParticipantKind, ParticipantUpdate, TurnChange,
};
pub use context::{AppConfig, AppConfigExt, ConfigError};
pub use records::{Character, Game, GamePlayer, Message, Note, PlayerRole, Viewer, Visible};
pub use remote::{MemoryStore, RecoveryAction, RemoteError, RemoteErrorKind, RemoteStore};
pub use signal_processor::{CombatLog, CombatSignal, SignalHandler};
pub use sync::{CommandQueue, FlushReport, SyncCommand};
pub use timers::{TimerEvent, TimerState, TurnTimer};
