mod combat_log;
mod handler;
mod signal;

pub use combat_log::{CombatLog, LogEntry};
pub use handler::SignalHandler;
pub use signal::CombatSignal;
