//! chatfold binary.
//!
//! # Usage
//!
//! ```bash
//! # Replay a log and print the room list
//! chatfold --events session.jsonl --user @me:example.org
//!
//! # Open a room, filter the room list
//! chatfold --events session.jsonl --config chatfold.json --room '!fam:example.org' --search fam
//! ```

use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use chatfold_app::{ChatConfig, Runtime};
use chatfold_cli::{CliError, ReplayTransport, SystemEnv, render};
use chatfold_core::{RoomId, UserId};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Replay a recorded chat event log and print the derived state
#[derive(Parser, Debug)]
#[command(name = "chatfold")]
#[command(about = "Replay a chat event log and print rooms and messages")]
#[command(version)]
struct Args {
    /// Event log (JSON lines)
    #[arg(short, long)]
    events: PathBuf,

    /// Config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local user id, overriding the config file
    #[arg(short, long)]
    user: Option<String>,

    /// Room to open after loading
    #[arg(short, long)]
    room: Option<String>,

    /// Filter the room list by name or latest message
    #[arg(short, long, default_value = "")]
    search: String,

    /// Backlog events delivered per room with the room list
    #[arg(long, default_value = "50")]
    initial: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    run(args).await?;
    Ok(())
}

async fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ChatConfig::default(),
    };
    if let Some(user) = args.user {
        config.local_user = UserId::new(user);
    }
    if config.local_user.is_empty() {
        tracing::warn!("no local user configured, own messages will count as unread");
    }

    let file = File::open(&args.events)
        .map_err(|source| CliError::Io { path: args.events.clone(), source })?;
    let transport =
        ReplayTransport::from_reader(BufReader::new(file), args.initial, config.local_user.clone())
            .map_err(|source| CliError::Io { path: args.events.clone(), source })?;

    let mut runtime = Runtime::new(transport, SystemEnv::new(), config);
    runtime.start().await?;
    if let Some(room) = args.room {
        runtime.select_room(Some(RoomId::new(room))).await?;
    }
    while runtime.process_cycle().await {}

    let facade = runtime.facade();
    let now = Local::now();
    let mut text = String::new();
    let summaries = facade.room_summaries(&args.search);
    render::room_list(&mut text, &summaries, facade.selected_room(), &now)?;
    if facade.selected_room().is_some() {
        text.push('\n');
        render::messages(&mut text, &facade.current_messages(), &Local)?;
    }
    std::io::stdout().lock().write_all(text.as_bytes())?;
    if let Some(status) = facade.status() {
        tracing::warn!(status, "session ended with status");
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ChatConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| CliError::Io { path: path.to_owned(), source })?;
    serde_json::from_str(&text).map_err(|source| CliError::Config { path: path.to_owned(), source })
}
