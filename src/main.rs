//! Demo driver for the store.
//!
//! Runs one of the demo features on a real-clock store, waits for its
//! effects to settle, and prints the final state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unistore::config::Config;
use unistore::features::app::{AppAction, AppReducer, AppState};
use unistore::features::counter::CounterAction;
use unistore::features::detail::DetailAction;
use unistore::features::search::SearchAction;
use unistore::features::Env;
use unistore::{PresentationAction, Store};

#[derive(Parser, Debug)]
#[command(name = "unistore")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Increment, tap a throttled button and wait for a delayed increment
    Counter {
        /// Number of rapid taps; only the first inside each cooldown counts
        #[arg(long, default_value_t = 5)]
        taps: u32,
    },
    /// Type queries in quick succession; only the last one is searched
    Search {
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Open a detail screen, let its timer tick, then close it from inside
    Detail {
        /// How long to keep the screen open, in milliseconds
        #[arg(long, default_value_t = 2500)]
        open_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;
    unistore::logging::init_tracing(&config.logging);

    let env = Env::demo(&config.demo);
    let settle = env.search_debounce + config.demo.search_latency() + Duration::from_millis(100);
    let store = Store::new(AppState::default(), AppReducer::new(), env)?;
    let _listener = store.subscribe(|state| tracing::debug!(?state, "State changed"));

    match args.command {
        Command::Counter { taps } => {
            store.dispatch(AppAction::Counter(CounterAction::Increment));
            store.dispatch(AppAction::Counter(CounterAction::Increment));
            for _ in 0..taps {
                store.dispatch(AppAction::Counter(CounterAction::Tap));
            }
            store.dispatch(AppAction::Counter(CounterAction::IncrementAfter(
                Duration::from_millis(200),
            )));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Command::Search { queries } => {
            for query in queries {
                store.dispatch(AppAction::Search(SearchAction::QueryChanged(query)));
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            tokio::time::sleep(settle).await;
        }
        Command::Detail { open_ms } => {
            store.dispatch(AppAction::OpenDetail {
                id: 1,
                title: "tokio".to_string(),
            });
            store.dispatch(AppAction::Detail(PresentationAction::Presented(
                DetailAction::StartTimer,
            )));
            tokio::time::sleep(Duration::from_millis(open_ms)).await;
            print_state(&store.state(), args.json)?;
            store.dispatch(AppAction::Detail(PresentationAction::Presented(
                DetailAction::Close,
            )));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    print_state(&store.state(), args.json)?;
    tracing::debug!(active = ?store.active_effect_keys(), "Shutting down");
    store.destroy();
    Ok(())
}

fn print_state(state: &AppState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    println!("counter: {}", state.counter.count);
    let search = &state.search;
    if !search.query.is_empty() {
        println!(
            "search: {:?} -> {:?} ({} completed)",
            search.query, search.results, search.completed_searches
        );
    }
    if let Some(error) = &search.error {
        println!("search error: {}", error);
    }
    match &state.detail {
        Some(detail) => println!(
            "detail: #{} {:?}, {} tick(s)",
            detail.id, detail.title, detail.ticks
        ),
        None => println!("detail: closed"),
    }
    Ok(())
}
