//! Ordered command queue with acknowledgement
//!
//! Commands are applied strictly in the order they were recorded. A flush
//! stops at the first command the store refuses so later writes never land
//! on top of a missing earlier one. Network failures are retried in place;
//! anything else parks the command as `Failed` until the caller retries or
//! discards it.

use std::collections::VecDeque;
use std::time::Duration;

use skirmish_types::SyncSettings;
use uuid::Uuid;

use super::command::SyncCommand;
use crate::remote::{RemoteError, RemoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
pub struct QueuedCommand {
    /// Monotonic sequence number, unique per queue
    pub seq: u64,
    /// Sent with every attempt so the store can drop duplicates
    pub idempotency_key: Uuid,
    pub command: SyncCommand,
    pub attempts: u32,
    pub status: CommandStatus,
    pub last_error: Option<RemoteError>,
}

/// Outcome of one `flush`
#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    pub acknowledged: Vec<u64>,
    /// The command that stopped the flush
    pub failed: Option<(u64, RemoteError)>,
    /// Commands still queued (including the failed one)
    pub pending: usize,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_none() && self.pending == 0
    }
}

#[derive(Debug)]
pub struct CommandQueue {
    queue: VecDeque<QueuedCommand>,
    next_seq: u64,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(&SyncSettings::default())
    }
}

impl CommandQueue {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            queue: VecDeque::new(),
            next_seq: 1,
            max_retries: settings.max_retries,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    pub fn enqueue(&mut self, command: SyncCommand) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back(QueuedCommand {
            seq,
            idempotency_key: Uuid::new_v4(),
            command,
            attempts: 0,
            status: CommandStatus::Pending,
            last_error: None,
        });
        seq
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = SyncCommand>) {
        for command in commands {
            self.enqueue(command);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.queue.iter()
    }

    /// The command blocking the queue, if any
    pub fn failed(&self) -> Option<&QueuedCommand> {
        self.queue
            .front()
            .filter(|c| c.status == CommandStatus::Failed)
    }

    /// Put a failed command back into play for the next flush.
    pub fn retry_failed(&mut self) -> bool {
        match self.queue.front_mut() {
            Some(cmd) if cmd.status == CommandStatus::Failed => {
                cmd.status = CommandStatus::Pending;
                true
            }
            _ => false,
        }
    }

    /// Drop a queued command, accepting that its write is lost.
    pub fn discard(&mut self, seq: u64) -> Option<QueuedCommand> {
        let idx = self.queue.iter().position(|c| c.seq == seq)?;
        let dropped = self.queue.remove(idx);
        if let Some(cmd) = &dropped {
            tracing::warn!(seq, command = %cmd.command.describe(), "Discarded queued command");
        }
        dropped
    }

    pub async fn flush<S>(&mut self, store: &S) -> FlushReport
    where
        S: RemoteStore + ?Sized,
    {
        let mut report = FlushReport::default();

        while let Some(cmd) = self.queue.front_mut() {
            if cmd.status == CommandStatus::Failed {
                report.failed = cmd.last_error.clone().map(|e| (cmd.seq, e));
                break;
            }

            match Self::deliver(cmd, store, self.max_retries, self.retry_backoff).await {
                Ok(()) => {
                    report.acknowledged.push(cmd.seq);
                    self.queue.pop_front();
                }
                Err(error) => {
                    tracing::warn!(
                        seq = cmd.seq,
                        command = %cmd.command.describe(),
                        attempts = cmd.attempts,
                        error = %error,
                        "Command rejected by store"
                    );
                    cmd.status = CommandStatus::Failed;
                    cmd.last_error = Some(error.clone());
                    report.failed = Some((cmd.seq, error));
                    break;
                }
            }
        }

        report.pending = self.queue.len();
        if !report.acknowledged.is_empty() {
            tracing::debug!(
                acknowledged = report.acknowledged.len(),
                pending = report.pending,
                "Flushed command queue"
            );
        }
        report
    }

    async fn deliver<S>(
        cmd: &mut QueuedCommand,
        store: &S,
        max_retries: u32,
        backoff: Duration,
    ) -> Result<(), RemoteError>
    where
        S: RemoteStore + ?Sized,
    {
        let mut retries = 0;
        loop {
            cmd.attempts += 1;
            match store.apply(&cmd.command, cmd.idempotency_key).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_retryable() && retries < max_retries => {
                    retries += 1;
                    tracing::debug!(seq = cmd.seq, retries, error = %error, "Retrying command");
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}
