use skirmish_core::{
    AppConfig, AppConfigExt, CombatLog, CombatTracker, CommandQueue, FlushReport, MemoryStore,
    SignalHandler,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Shared handle to the combat tracker.
pub type TrackerHandle = Arc<RwLock<CombatTracker>>;

#[derive(Default)]
pub struct BackgroundTasks {
    pub ticker: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn abort_all(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in the individual state types.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub game_id: Uuid,
    pub tracker: TrackerHandle,
    pub queue: Arc<Mutex<CommandQueue>>,
    pub store: Arc<MemoryStore>,
    pub log: Arc<Mutex<CombatLog>>,
    pub tasks: Arc<Mutex<BackgroundTasks>>,
}

impl CliContext {
    pub fn new() -> Self {
        let mut config = AppConfig::load();
        let had_game = config.game_id.clone();
        let game_id = config.game_uuid();
        if config.game_id != had_game
            && let Err(e) = config.save()
        {
            tracing::warn!(error = %e, "Could not persist generated game id");
        }

        Self {
            game_id,
            tracker: Arc::new(RwLock::new(CombatTracker::new(config.tracker.clone()))),
            queue: Arc::new(Mutex::new(CommandQueue::new(&config.sync))),
            store: Arc::new(MemoryStore::new()),
            log: Arc::new(Mutex::new(CombatLog::default())),
            tasks: Arc::new(Mutex::new(BackgroundTasks::default())),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Move what the tracker recorded since the last call into the combat
    /// log and the command queue. Returns the new log lines.
    pub async fn publish(&self, tracker: &mut CombatTracker) -> Vec<String> {
        let signals = tracker.drain_signals();
        let commands = tracker.drain_commands();

        let mut log = self.log.lock().await;
        let mark = log.total_written();
        log.handle_signals(&signals, tracker.combat());
        let lines = log.since(mark).map(|e| e.text.clone()).collect();
        drop(log);

        self.queue.lock().await.extend(commands);
        lines
    }

    /// Flush queued commands to the store
    pub async fn flush(&self) -> FlushReport {
        self.queue.lock().await.flush(self.store.as_ref()).await
    }

    pub async fn auto_flush(&self) -> bool {
        self.config.read().await.sync.auto_flush
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
