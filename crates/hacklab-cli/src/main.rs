//! hacklab: console front end for the portfolio puzzle lab.
//!
//! Reads lines from stdin. Plain lines go to the terminal interpreter;
//! lines starting with `:` drive the hint unlock panel.

mod config;
mod repl;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hacklab_engine::catalog::default_catalog;
use hacklab_engine::registry::{Catalog, PuzzleRegistry};
use hacklab_engine::terminal::{SubmitOutcome, Terminal};
use hacklab_engine::unlock::UnlockEvent;
use hacklab_engine::Lab;
use hacklab_store::{ChangeFeed, KvStore, MemoryStore, Persistence, SqliteStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::LabConfig;
use crate::repl::Meta;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = LabConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("hacklab={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("hacklab starting");

    // 2. Open storage
    let store: Arc<dyn KvStore> = if config.storage.in_memory {
        info!("using in-memory storage");
        Arc::new(MemoryStore::new())
    } else {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let db_path = config.database_path();
        info!("opening database at {:?}", db_path);
        Arc::new(SqliteStore::open(&db_path)?)
    };

    // 3. Load and validate the catalog
    let catalog = if config.catalog.path.is_empty() {
        default_catalog()
    } else {
        Catalog::load(Path::new(&config.catalog.path))?
    };
    let registry = Arc::new(PuzzleRegistry::new(catalog)?);
    info!(puzzles = registry.len(), "catalog loaded");

    // 4. Build the lab and mount the terminal
    let lab = Lab::new(
        registry,
        Persistence::new(store, ChangeFeed::default()),
        config.engine(),
    );
    let terminal = lab.terminal();
    let mut shown = print_log(&terminal, 0);
    terminal.mount();

    let mut unlock_events = lab.hints().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(&lab, &terminal, &line).await {
                    break;
                }
                shown = print_log(&terminal, shown);
            }
            event = unlock_events.recv() => {
                if let Ok(event) = event {
                    print_unlock_event(&lab, &event);
                }
            }
            _ = refresh.tick() => {
                shown = print_log(&terminal, shown);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    terminal.unmount();
    info!("hacklab stopped");
    Ok(())
}

/// Returns `false` when the player asked to quit.
async fn handle_line(lab: &Lab, terminal: &Terminal, line: &str) -> bool {
    let Some(meta) = repl::parse_meta(line) else {
        match terminal.submit(line).await {
            SubmitOutcome::Booting => println!("(still booting...)"),
            SubmitOutcome::Busy => println!("(busy)"),
            SubmitOutcome::Unmounted => return false,
            SubmitOutcome::Handled | SubmitOutcome::Ignored => {}
        }
        return true;
    };

    match meta {
        Ok(Meta::Unlock { puzzle_id, tier }) => {
            let tier = tier.unwrap_or_else(|| lab.progress().hint_usage(&puzzle_id) + 1);
            let request = lab.request_unlock(&puzzle_id, tier);
            println!("{}", repl::describe_request(&puzzle_id, tier, request));
            if let Some(view) = lab.ritual() {
                println!("{}", repl::describe_ritual(&view));
            }
        }
        Ok(Meta::Confirm) => {
            if !lab.confirm() {
                println!("nothing to confirm");
            }
        }
        Ok(Meta::Tap) => {
            if !lab.tap() {
                if let Some(view) = lab.ritual() {
                    println!("{}", repl::describe_ritual(&view));
                }
            }
        }
        Ok(Meta::Cancel) => {
            if !lab.cancel() {
                println!("no pending ritual");
            }
        }
        Ok(Meta::Ritual) => match lab.ritual() {
            Some(view) => println!("{}", repl::describe_ritual(&view)),
            None => println!("no pending ritual"),
        },
        Ok(Meta::Help) => {
            for line in repl::META_HELP {
                println!("{line}");
            }
        }
        Ok(Meta::Quit) => return false,
        Err(message) => println!("{message}"),
    }
    true
}

fn print_unlock_event(lab: &Lab, event: &UnlockEvent) {
    if let Some(line) = repl::describe_event(event) {
        println!("{line}");
    }
    if let UnlockEvent::Granted { puzzle_id, tier } = event {
        match lab.unlocked_hints(puzzle_id).iter().find(|h| h.tier == *tier) {
            Some(hint) => println!("  hint {}: {}", hint.tier, hint.text),
            None => warn!(puzzle_id = %puzzle_id, tier, "granted hint not found"),
        }
    }
}

/// Print log lines past `shown`. Returns the new count.
fn print_log(terminal: &Terminal, shown: usize) -> usize {
    let log = terminal.log();
    // `clear` shrinks the log
    let start = if log.len() < shown { 0 } else { shown };
    for line in &log[start..] {
        println!("{line}");
    }
    log.len()
}
