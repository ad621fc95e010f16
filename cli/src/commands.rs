use std::time::Instant;

use skirmish_core::sync::CommandStatus;
use skirmish_core::{
    AppConfigExt, CombatParticipant, CombatTracker, Condition, ParticipantId, ParticipantUpdate,
    RecoveryAction, RemoteStore, TimerState,
};

use crate::context::CliContext;

/// Resolve a participant by 1-based position or by (case-insensitive) name.
/// A name prefix works when it matches exactly one participant.
fn resolve(tracker: &CombatTracker, query: &str) -> Result<ParticipantId, String> {
    let combat = tracker.combat().ok_or("No combat. Use `new` first")?;

    if let Ok(position) = query.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|idx| combat.participants.get(idx))
            .map(|p| p.id)
            .ok_or_else(|| format!("No participant at position {position}"));
    }

    let needle = query.to_lowercase();
    if let Some(p) = combat
        .participants
        .iter()
        .find(|p| p.display_name().to_lowercase() == needle)
    {
        return Ok(p.id);
    }

    let mut matches = combat
        .participants
        .iter()
        .filter(|p| p.display_name().to_lowercase().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(p), None) => Ok(p.id),
        (Some(_), Some(_)) => Err(format!("'{query}' matches more than one participant")),
        _ => Err(format!("No participant named '{query}'")),
    }
}

fn position(value: usize, what: &str) -> Result<usize, String> {
    value
        .checked_sub(1)
        .ok_or_else(|| format!("{what} positions start at 1"))
}

/// Run a tracker operation, then log its signals and queue its commands
async fn mutate<T>(
    ctx: &CliContext,
    op: impl FnOnce(&mut CombatTracker) -> Result<T, String>,
) -> Result<T, String> {
    let (value, lines) = {
        let mut tracker = ctx.tracker.write().await;
        let value = op(&mut *tracker)?;
        let lines = ctx.publish(&mut *tracker).await;
        (value, lines)
    };

    for line in lines {
        println!("  {line}");
    }
    if ctx.auto_flush().await {
        report_flush(ctx).await;
    }
    Ok(value)
}

async fn report_flush(ctx: &CliContext) {
    let report = ctx.flush().await;
    if let Some((seq, err)) = &report.failed {
        println!("  sync stopped at #{seq}: {err}");
        let recovery = err.recovery();
        if recovery != RecoveryAction::None {
            println!("  hint: {}", recovery.hint());
        }
        println!("  {} command(s) waiting; `retry` or `discard {seq}`", report.pending);
    }
}

// ─── Lifecycle ──────────────────────────────────────────────────────────────

pub async fn new_combat(ctx: &CliContext, name: &str, timer: Option<u32>) -> Result<(), String> {
    let game_id = ctx.game_id;
    let id = mutate(ctx, |t| {
        t.create_combat(game_id, name, timer)
            .map_err(|e| e.to_string())
    })
    .await?;
    ctx.log.lock().await.clear();
    println!("Created combat '{name}' ({id})");
    Ok(())
}

pub async fn start(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.start(Instant::now()).map_err(|e| e.to_string())).await
}

pub async fn pause(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.pause(Instant::now()).map_err(|e| e.to_string())).await
}

pub async fn resume(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.resume(Instant::now()).map_err(|e| e.to_string())).await
}

pub async fn end(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.end().map_err(|e| e.to_string())).await
}

pub async fn next_turn(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.next_turn(Instant::now()).map_err(|e| e.to_string())).await?;
    Ok(())
}

pub async fn previous_turn(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| {
        t.previous_turn(Instant::now()).map_err(|e| e.to_string())
    })
    .await?;
    Ok(())
}

// ─── Participants ───────────────────────────────────────────────────────────

pub async fn add_participant(
    ctx: &CliContext,
    name: &str,
    initiative: i32,
    hp: Option<i32>,
    armor_class: Option<i32>,
    hidden: bool,
) -> Result<(), String> {
    let mut participant = CombatParticipant::npc(name, initiative);
    if let Some(hp) = hp {
        participant = participant.with_hp(hp);
    }
    if let Some(ac) = armor_class {
        participant = participant.with_armor_class(ac);
    }
    if hidden {
        participant = participant.hidden();
    }
    mutate(ctx, |t| {
        t.add_participant(participant).map_err(|e| e.to_string())
    })
    .await?;
    Ok(())
}

pub async fn edit_participant(
    ctx: &CliContext,
    target: &str,
    update: ParticipantUpdate,
) -> Result<(), String> {
    mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.update_participant(id, update).map_err(|e| e.to_string())
    })
    .await?;
    println!("Updated {target}");
    Ok(())
}

pub async fn remove_participant(ctx: &CliContext, target: &str) -> Result<(), String> {
    mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.remove_participant(id, Instant::now()).map_err(|e| e.to_string())
    })
    .await?;
    Ok(())
}

pub async fn damage(ctx: &CliContext, target: &str, amount: u32) -> Result<(), String> {
    mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.deal_damage(id, amount).map_err(|e| e.to_string())
    })
    .await?;
    Ok(())
}

pub async fn heal(ctx: &CliContext, target: &str, amount: u32) -> Result<(), String> {
    let outcome = mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.heal(id, amount).map_err(|e| e.to_string())
    })
    .await?;
    if outcome.revived {
        println!("  back on their feet");
    }
    Ok(())
}

pub async fn move_participant(ctx: &CliContext, from: usize, to: usize) -> Result<(), String> {
    let from = position(from, "Turn order")?;
    let to = position(to, "Turn order")?;
    mutate(ctx, |t| t.reorder(from, to).map_err(|e| e.to_string())).await?;
    show(ctx, false).await
}

pub async fn sort(ctx: &CliContext) -> Result<(), String> {
    mutate(ctx, |t| t.sort_by_initiative().map_err(|e| e.to_string())).await?;
    show(ctx, false).await
}

// ─── Conditions ─────────────────────────────────────────────────────────────

fn build_condition(
    name: &str,
    rounds: Option<u32>,
    source: Option<&str>,
    note: Option<&str>,
) -> Condition {
    let mut condition = Condition::new(name);
    if let Some(rounds) = rounds {
        condition = condition.with_duration(rounds);
    }
    if let Some(source) = source {
        condition = condition.with_source(source);
    }
    if let Some(note) = note {
        condition = condition.with_description(note);
    }
    condition
}

pub async fn add_condition(
    ctx: &CliContext,
    target: &str,
    name: &str,
    rounds: Option<u32>,
    source: Option<&str>,
    note: Option<&str>,
) -> Result<(), String> {
    let condition = build_condition(name, rounds, source, note);
    let replaced = mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.add_condition(id, condition).map_err(|e| e.to_string())
    })
    .await?;
    if let Some(old) = replaced {
        println!("  (replaced existing '{}')", old.name);
    }
    Ok(())
}

pub async fn update_condition(
    ctx: &CliContext,
    target: &str,
    name: &str,
    rounds: Option<u32>,
    source: Option<&str>,
    note: Option<&str>,
) -> Result<(), String> {
    let condition = build_condition(name, rounds, source, note);
    mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.update_condition(id, name, condition)
            .map_err(|e| e.to_string())
    })
    .await?;
    println!("Updated {name} on {target}");
    Ok(())
}

pub async fn remove_condition(ctx: &CliContext, target: &str, name: &str) -> Result<(), String> {
    mutate(ctx, |t| {
        let id = resolve(t, target)?;
        t.remove_condition(id, name).map_err(|e| e.to_string())
    })
    .await?;
    Ok(())
}

// ─── Timer ──────────────────────────────────────────────────────────────────

pub async fn set_timer(ctx: &CliContext, secs: Option<u32>, off: bool) -> Result<(), String> {
    if secs.is_none() && !off {
        return show_timer(ctx).await;
    }
    let secs = if off { None } else { secs };
    mutate(ctx, |t| {
        t.set_turn_timer(secs, Instant::now())
            .map_err(|e| e.to_string())
    })
    .await?;
    match secs {
        Some(secs) => println!("Turn timer set to {secs}s"),
        None => println!("Turn timer off"),
    }
    Ok(())
}

async fn show_timer(ctx: &CliContext) -> Result<(), String> {
    let tracker = ctx.tracker.read().await;
    let timer = tracker.timer();
    let now = Instant::now();
    match timer.state() {
        TimerState::Idle => println!("Timer idle"),
        TimerState::Running => println!(
            "{:.1}s left ({:.0}%)",
            timer.remaining_secs(now),
            timer.fill_percent(now) * 100.0
        ),
        TimerState::Paused => println!("Paused with {:.1}s left", timer.remaining_secs(now)),
        TimerState::Expired => println!("Time is up"),
    }
    Ok(())
}

// ─── Views ──────────────────────────────────────────────────────────────────

pub async fn show(ctx: &CliContext, as_player: bool) -> Result<(), String> {
    let tracker = ctx.tracker.read().await;
    let Some(combat) = tracker.combat() else {
        println!("No combat");
        return Ok(());
    };

    let status = match (combat.is_active, combat.is_paused) {
        (false, _) => "not running",
        (true, true) => "paused",
        (true, false) => "active",
    };
    println!("{} - round {} ({status})", combat.name, combat.round);
    println!(
        "{:<3} {:<2} {:<24} {:>4} {:>9} {:>3}  Conditions",
        "#", "", "Name", "Init", "HP", "AC"
    );
    println!("{}", "-".repeat(72));

    let acting = tracker.current_participant().map(|p| p.id);
    for (idx, p) in combat.participants.iter().enumerate() {
        if as_player && !p.is_visible {
            continue;
        }
        let marker = if combat.is_active && Some(p.id) == acting {
            ">"
        } else {
            ""
        };
        let hp = match (p.current_hp, p.max_hp) {
            (Some(current), Some(max)) => format!("{current}/{max}"),
            (Some(current), None) => current.to_string(),
            _ => "-".to_string(),
        };
        let ac = p
            .armor_class
            .map(|ac| ac.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut name = p.display_name().to_string();
        if !p.is_visible {
            name.push_str(" (hidden)");
        }
        if p.is_down() {
            name.push_str(" [down]");
        }
        let conditions = p
            .conditions
            .iter()
            .map(|c| match c.duration_rounds {
                Some(rounds) => format!("{} ({rounds})", c.name),
                None => c.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<3} {:<2} {:<24} {:>4} {:>9} {:>3}  {}",
            idx + 1,
            marker,
            name,
            p.initiative,
            hp,
            ac,
            conditions
        );
    }
    Ok(())
}

pub async fn show_log(ctx: &CliContext, limit: usize) -> Result<(), String> {
    let log = ctx.log.lock().await;
    if log.is_empty() {
        println!("Nothing has happened yet");
        return Ok(());
    }
    for entry in log.entries().skip(log.len().saturating_sub(limit)) {
        println!(
            "{} R{:<3} {}",
            entry.at.format("%H:%M:%S"),
            entry.round,
            entry.text
        );
    }
    Ok(())
}

// ─── Sync ───────────────────────────────────────────────────────────────────

pub async fn sync(ctx: &CliContext) -> Result<(), String> {
    let report = ctx.flush().await;
    println!("{} command(s) acknowledged", report.acknowledged.len());
    if report.failed.is_some() {
        // Prints the failure and recovery hint
        report_flush(ctx).await;
    } else if report.pending > 0 {
        println!("{} command(s) still pending", report.pending);
    }
    Ok(())
}

pub async fn show_queue(ctx: &CliContext, as_json: bool) -> Result<(), String> {
    let queue = ctx.queue.lock().await;
    if queue.is_empty() {
        println!("Queue is empty");
        return Ok(());
    }
    for cmd in queue.iter() {
        let status = match cmd.status {
            CommandStatus::Pending => "pending",
            CommandStatus::Failed => "FAILED",
        };
        println!(
            "#{:<4} {:<8} {:<22} {} (attempts: {})",
            cmd.seq,
            status,
            cmd.command.table(),
            cmd.command.describe(),
            cmd.attempts
        );
        if let Some(err) = &cmd.last_error {
            println!("       {err}");
        }
        if as_json {
            let payload = cmd.command.to_json().map_err(|e| e.to_string())?;
            println!("       {payload}");
        }
    }
    Ok(())
}

pub async fn retry(ctx: &CliContext) -> Result<(), String> {
    if !ctx.queue.lock().await.retry_failed() {
        return Err("Nothing to retry".to_string());
    }
    sync(ctx).await
}

pub async fn discard(ctx: &CliContext, seq: u64) -> Result<(), String> {
    let removed = ctx
        .queue
        .lock()
        .await
        .discard(seq)
        .ok_or_else(|| format!("No queued command #{seq}"))?;
    println!("Discarded #{seq} ({})", removed.command.describe());
    Ok(())
}

/// Replace local state with what the store holds for the current combat
pub async fn reload(ctx: &CliContext) -> Result<(), String> {
    let combat_id = ctx
        .tracker
        .read()
        .await
        .combat()
        .map(|c| c.id)
        .ok_or("No combat to reload")?;

    if !ctx.queue.lock().await.is_empty() {
        return Err("Unsynced changes are queued; `sync` or `discard` them first".to_string());
    }

    let combat = ctx.store.fetch_combat(combat_id).await.map_err(|e| {
        let hint = e.recovery().hint();
        if hint.is_empty() {
            e.to_string()
        } else {
            format!("{e} ({hint})")
        }
    })?;
    ctx.tracker
        .write()
        .await
        .load_combat(combat, Instant::now());
    println!("Reloaded combat {combat_id}");
    show(ctx, false).await
}

// ─── Settings ───────────────────────────────────────────────────────────────

pub async fn show_settings(ctx: &CliContext) -> Result<(), String> {
    let config = ctx.config.read().await;
    println!("game:              {}", ctx.game_id);
    println!(
        "default timer:     {}",
        config
            .tracker
            .default_turn_timer_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "off".to_string())
    );
    println!("expire conditions: {}", config.tracker.expire_conditions);
    println!("auto advance:      {}", config.tracker.auto_advance_on_timeout);
    println!("tick interval:     {}ms", config.tracker.tick_interval_ms);
    println!("max retries:       {}", config.sync.max_retries);
    println!("retry backoff:     {}ms", config.sync.retry_backoff_ms);
    println!("auto flush:        {}", config.sync.auto_flush);
    Ok(())
}

pub async fn set_option(ctx: &CliContext, key: &str, value: &str) -> Result<(), String> {
    let mut config = ctx.config.write().await;
    let flag = || {
        value
            .parse::<bool>()
            .map_err(|_| format!("'{value}' is not true/false"))
    };
    match key {
        "expire-conditions" => config.tracker.expire_conditions = flag()?,
        "auto-advance" => config.tracker.auto_advance_on_timeout = flag()?,
        "auto-flush" => config.sync.auto_flush = flag()?,
        "default-timer" => {
            config.tracker.default_turn_timer_secs = match value {
                "off" => None,
                secs => Some(
                    secs.parse()
                        .map_err(|_| format!("'{secs}' is not a number of seconds"))?,
                ),
            }
        }
        other => return Err(format!("Unknown setting '{other}'")),
    }

    ctx.tracker
        .write()
        .await
        .set_settings(config.tracker.clone());
    config.save().map_err(|e| e.to_string())?;
    println!("Saved {key} = {value}");
    Ok(())
}

pub fn exit() {
    println!("quitting...");
}
