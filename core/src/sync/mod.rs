//! Store synchronization
//!
//! The tracker records a `SyncCommand` for each mutation. Callers move those
//! into a `CommandQueue` and flush it against a `RemoteStore` whenever they
//! like; the queue reports what was acknowledged and what is stuck.

mod command;
mod queue;


pub use command::SyncCommand;
pub use queue::{CommandQueue, CommandStatus, FlushReport, QueuedCommand};
