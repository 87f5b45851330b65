#![forbid(unsafe_code)]

//! `chesscli`: drive a UCI engine and inspect local chesscli data.
//!
//! Subcommands analyse a position with the configured engine, summarise the
//! saved puzzle collection, read or set the remembered username, and play a
//! sound effect.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use chesscli_engine::engine::{BestMove, UciCommand};
use chesscli_engine::models::Classification;
use chesscli_engine::persistence::UserStore;
use chesscli_engine::sound::{SoundPaths, SoundPlayer};
use chesscli_engine::{AppError, GlobalConfig, Result, Session};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "chesscli", about = "UCI engine session and chesscli data tools", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search a position and print the engine's output.
    Analyse {
        /// Position as FEN.
        #[arg(long, conflicts_with = "moves")]
        fen: Option<String>,

        /// Space-separated UCI moves from the start position.
        #[arg(long)]
        moves: Option<String>,

        /// Search depth; defaults to `engine.default_depth`.
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Summarise the saved puzzle collection.
    Puzzles,

    /// Print the remembered username, or remember a new one.
    Username {
        /// New username to store.
        name: Option<String>,
    },

    /// Play a sound effect (`move`, `capture`, `check`, `castle`).
    PlaySound {
        /// Event key.
        event: String,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };

    match args.command {
        Command::Analyse { fen, moves, depth } => {
            let depth = depth.unwrap_or(config.engine.default_depth);
            analyse(&config, fen, moves, depth).await
        }
        Command::Puzzles => {
            summarise_puzzles(&config);
            Ok(())
        }
        Command::Username { name } => username(name),
        Command::PlaySound { event } => play_sound(&config, &event).await,
    }
}

async fn analyse(
    config: &GlobalConfig,
    fen: Option<String>,
    moves: Option<String>,
    depth: u32,
) -> Result<()> {
    let session = Session::start(config.engine.session_config()).await?;
    info!(depth, "analysing position");

    let result = match fen {
        Some(fen) => session.evaluate(&fen, depth).await,
        None => {
            let moves = moves.unwrap_or_default();
            let position = UciCommand::startpos_with_moves(moves.split_whitespace());
            session
                .evaluate_incremental(&position.to_string(), depth)
                .await
        }
    };
    session.stop().await;

    let lines = result?;
    for line in &lines {
        println!("{line}");
    }
    if let Some(best) = BestMove::from_lines(&lines) {
        match best.ponder {
            Some(ponder) => println!("best move: {} (ponder {ponder})", best.mv),
            None => println!("best move: {}", best.mv),
        }
    }
    Ok(())
}

fn summarise_puzzles(config: &GlobalConfig) {
    let Some(puzzles) = config.puzzle_store().and_then(|store| store.read_puzzles()) else {
        println!("no saved puzzles");
        return;
    };

    let mut by_class: BTreeMap<&'static str, usize> = BTreeMap::new();
    for puzzle in &puzzles {
        *by_class.entry(puzzle.classification.as_str()).or_default() += 1;
    }
    let solved = puzzles.iter().filter(|p| p.solve_count > 0).count();

    println!("{} puzzle(s), {solved} solved at least once", puzzles.len());
    for class in Classification::ALL {
        if let Some(count) = by_class.get(class.as_str()) {
            println!("  {class}: {count}");
        }
    }
}

fn username(name: Option<String>) -> Result<()> {
    let store = UserStore::default_location()
        .ok_or_else(|| AppError::Config("cannot determine home directory".into()))?;

    match name {
        Some(name) => {
            if !store.write_username(&name) {
                warn!(path = %store.path().display(), "username not saved");
            }
        }
        None => match store.read_username() {
            Some(name) => println!("{name}"),
            None => println!("(no username set)"),
        },
    }
    Ok(())
}

async fn play_sound(config: &GlobalConfig, event: &str) -> Result<()> {
    let paths = SoundPaths::from_asset_dir(&config.sound.asset_dir);
    let player = if config.sound.enabled {
        SoundPlayer::new(config.sound.player.clone(), paths)
    } else {
        SoundPlayer::disabled(paths)
    };

    if !player.play_key(event) {
        warn!(event, "sound not played");
    }
    // Let the detached player get going before the runtime shuts down.
    tokio::task::yield_now().await;
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
