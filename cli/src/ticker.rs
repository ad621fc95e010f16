//! Background task driving the turn timer

use std::time::{Duration, Instant};

use skirmish_core::TimerEvent;
use tokio::task::JoinHandle;

use crate::context::CliContext;

/// Spawn the tick loop. Expiry lines are printed as they happen.
pub async fn spawn_ticker(ctx: &CliContext) -> JoinHandle<()> {
    let interval_ms = ctx.config.read().await.tracker.tick_interval_ms.max(10);
    let ctx = ctx.clone();

    tracing::debug!(interval_ms, "Starting turn ticker");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;

            let lines = {
                let mut tracker = ctx.tracker.write().await;
                match tracker.tick(Instant::now()) {
                    Some(TimerEvent::Expired) => ctx.publish(&mut *tracker).await,
                    None => continue,
                }
            };

            for line in lines {
                println!("\n[timer] {line}");
            }
            if ctx.auto_flush().await {
                let report = ctx.flush().await;
                if let Some((seq, err)) = report.failed {
                    tracing::warn!(seq, error = %err, "Sync after timeout failed");
                }
            }
        }
    })
}
