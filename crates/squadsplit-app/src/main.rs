// squadsplit entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the rendered teams)
// 2. Load config
// 3. Load the roster
// 4. Open database and restore the session
// 5. Run the requested subcommand

use std::path::Path;

use squadsplit_app::app::Session;
use squadsplit_app::config;
use squadsplit_app::db;
use squadsplit_app::render;
use squadsplit_app::roster;

use anyhow::Context;
use clap::{Parser, Subcommand};
use squadsplit_core::ParticipantId;
use tracing::{error, info};

/// Split a group into two balanced teams.
#[derive(Debug, Parser)]
#[command(name = "squadsplit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate new teams from the given participant ids (whole roster when none).
    Generate { ids: Vec<String> },
    /// Keep a participant on their current team in the next generation.
    Lock { id: String },
    /// Release a locked participant.
    Unlock { id: String },
    /// Release every lock.
    ClearLocks,
    /// Print the last generated teams.
    Show,
    /// Forget all generations, locks and history.
    Reset,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing()?;
    info!("squadsplit starting: {:?}", cli.command);

    if let Err(e) = run(cli.command) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(command: Command) -> anyhow::Result<()> {
    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: group={}, max_diff={}, exhaustive_limit={}",
        config.group.name, config.balance.max_diff, config.balance.exhaustive_limit
    );

    // 3. Load the roster
    let participants = roster::load_roster(Path::new(&config.group.roster_path))
        .context("failed to load roster")?;
    info!("Loaded {} participants", participants.len());

    // 4. Open database and restore the session
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);
    let mut session = Session::open(config, participants, db)?;

    // 5. Dispatch
    match command {
        Command::Generate { ids } => {
            let ids: Vec<ParticipantId> = ids.into_iter().map(ParticipantId::new).collect();
            let lineup = session.generate(&ids)?;
            print_lineup(&session, &lineup);
        }
        Command::Lock { id } => {
            let id = ParticipantId::new(id);
            let side = session.lock(&id)?;
            println!("{id} locked on team {side}");
        }
        Command::Unlock { id } => {
            let id = ParticipantId::new(id);
            if session.unlock(&id)? {
                println!("{id} unlocked");
            } else {
                println!("{id} was not locked");
            }
        }
        Command::ClearLocks => {
            session.clear_locks()?;
            println!("All locks cleared");
        }
        Command::Show => match session.current()? {
            Some(lineup) => print_lineup(&session, &lineup),
            None => println!("No teams generated yet"),
        },
        Command::Reset => {
            session.reset()?;
            println!("Session reset");
        }
    }
    Ok(())
}

fn print_lineup(session: &Session, lineup: &squadsplit_core::Lineup) {
    let config = session.config();
    print!(
        "{}",
        render::render_lineup(&config.group.name, lineup, session.locks(), config.balance.max_diff)
    );
}

/// Initialize tracing to log to a file (stdout is reserved for command output).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("squadsplit.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("squadsplit_app=info,squadsplit_core=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
