use clap::{Parser, Subcommand};
use skirmish_cli::CliContext;
use skirmish_cli::commands;
use skirmish_cli::logging;
use skirmish_cli::readline;
use skirmish_cli::ticker;
use skirmish_core::ParticipantUpdate;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let ctx = CliContext::new();

    let handle = ticker::spawn_ticker(&ctx).await;
    ctx.tasks.lock().await.ticker = Some(handle);

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.tasks.lock().await.abort_all();
    let pending = ctx.queue.lock().await.len();
    if pending > 0 {
        tracing::warn!(pending, "Exiting with unsynced commands");
    }
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "combat tracker shell")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new combat
    New {
        name: String,
        /// Seconds per turn
        #[arg(short, long)]
        timer: Option<u32>,
    },
    Start,
    Pause,
    Resume,
    End,
    Next,
    Prev,
    /// Add an NPC to the end of the turn order
    Add {
        name: String,
        #[arg(short, long, allow_hyphen_values = true)]
        init: i32,
        #[arg(long)]
        hp: Option<i32>,
        #[arg(long)]
        ac: Option<i32>,
        /// Hide from players
        #[arg(long)]
        hidden: bool,
    },
    /// Change a participant; target is a position or name
    Edit {
        target: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        init: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        hp: Option<i32>,
        #[arg(long)]
        max_hp: Option<i32>,
        #[arg(long)]
        ac: Option<i32>,
        #[arg(long)]
        visible: Option<bool>,
    },
    Remove {
        target: String,
    },
    Damage {
        target: String,
        amount: u32,
    },
    Heal {
        target: String,
        amount: u32,
    },
    /// Move a participant within the turn order (1-based positions)
    Move {
        from: usize,
        to: usize,
    },
    /// Sort by initiative, highest first
    Sort,
    CondAdd {
        target: String,
        name: String,
        #[arg(short, long)]
        rounds: Option<u32>,
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
    CondSet {
        target: String,
        name: String,
        #[arg(short, long)]
        rounds: Option<u32>,
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
    CondRm {
        target: String,
        name: String,
    },
    /// Show the timer, or set seconds per turn
    Timer {
        secs: Option<u32>,
        #[arg(long)]
        off: bool,
    },
    Show {
        /// Show only what players can see
        #[arg(long)]
        player: bool,
    },
    Log {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Send queued changes to the store
    Sync,
    /// List unsynced commands
    Queue {
        /// Print each command's JSON payload
        #[arg(long)]
        json: bool,
    },
    Retry,
    Discard {
        seq: u64,
    },
    Reload,
    Config,
    Set {
        key: String,
        value: String,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "skirmish".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::New { name, timer }) => commands::new_combat(ctx, &name, timer).await?,
        Some(Commands::Start) => commands::start(ctx).await?,
        Some(Commands::Pause) => commands::pause(ctx).await?,
        Some(Commands::Resume) => commands::resume(ctx).await?,
        Some(Commands::End) => commands::end(ctx).await?,
        Some(Commands::Next) => commands::next_turn(ctx).await?,
        Some(Commands::Prev) => commands::previous_turn(ctx).await?,
        Some(Commands::Add {
            name,
            init,
            hp,
            ac,
            hidden,
        }) => commands::add_participant(ctx, &name, init, hp, ac, hidden).await?,
        Some(Commands::Edit {
            target,
            name,
            init,
            hp,
            max_hp,
            ac,
            visible,
        }) => {
            let update = ParticipantUpdate {
                name,
                initiative: init,
                current_hp: hp,
                max_hp,
                armor_class: ac,
                is_visible: visible,
            };
            commands::edit_participant(ctx, &target, update).await?
        }
        Some(Commands::Remove { target }) => commands::remove_participant(ctx, &target).await?,
        Some(Commands::Damage { target, amount }) => commands::damage(ctx, &target, amount).await?,
        Some(Commands::Heal { target, amount }) => commands::heal(ctx, &target, amount).await?,
        Some(Commands::Move { from, to }) => commands::move_participant(ctx, from, to).await?,
        Some(Commands::Sort) => commands::sort(ctx).await?,
        Some(Commands::CondAdd {
            target,
            name,
            rounds,
            source,
            note,
        }) => {
            commands::add_condition(
                ctx,
                &target,
                &name,
                rounds,
                source.as_deref(),
                note.as_deref(),
            )
            .await?
        }
        Some(Commands::CondSet {
            target,
            name,
            rounds,
            source,
            note,
        }) => {
            commands::update_condition(
                ctx,
                &target,
                &name,
                rounds,
                source.as_deref(),
                note.as_deref(),
            )
            .await?
        }
        Some(Commands::CondRm { target, name }) => {
            commands::remove_condition(ctx, &target, &name).await?
        }
        Some(Commands::Timer { secs, off }) => commands::set_timer(ctx, secs, off).await?,
        Some(Commands::Show { player }) => commands::show(ctx, player).await?,
        Some(Commands::Log { limit }) => commands::show_log(ctx, limit).await?,
        Some(Commands::Sync) => commands::sync(ctx).await?,
        Some(Commands::Queue { json }) => commands::show_queue(ctx, json).await?,
        Some(Commands::Retry) => commands::retry(ctx).await?,
        Some(Commands::Discard { seq }) => commands::discard(ctx, seq).await?,
        Some(Commands::Reload) => commands::reload(ctx).await?,
        Some(Commands::Config) => commands::show_settings(ctx).await?,
        Some(Commands::Set { key, value }) => commands::set_option(ctx, &key, &value).await?,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
