// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plura - a unified LLM provider layer.
//!
//! This is the binary entry point for the Plura server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod runtime;
mod wiring;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plura_core::traits::{JobScheduler, NotificationBus, SessionStore};
use plura_oauth::{start_server, CallbackServerConfig, CallbackState, OAuthStateMap, RefreshScheduler};

use crate::runtime::{
    run_refresh_worker, run_state_sweeper, InProcessStore, LogBus, TokioScheduler,
};
use crate::wiring::build_registry;

/// Plura - a unified LLM provider layer.
#[derive(Parser, Debug)]
#[command(name = "plura", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the OAuth callback server and token refresh worker.
    Serve,
    /// Validate provider registrations and print the compliance report.
    Doctor,
    /// Print the merged configuration.
    Config,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("plura=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match plura_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("plura: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve(&config).await {
                eprintln!("plura serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor) => doctor(&config),
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("plura config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("plura: use --help for available commands");
        }
    }
}

/// Prints the compliance report and exits non-zero when no provider is
/// fully usable.
fn doctor(config: &plura_config::PluraConfig) {
    let registry = build_registry(config);
    let report = registry.registry();

    let mut any_valid = false;
    for entry in report.iter() {
        let operations: Vec<String> =
            entry.operations.iter().map(|op| op.to_string()).collect();
        if entry.is_valid() {
            any_valid = true;
            println!("{}: valid ({})", entry.provider, operations.join(", "));
        } else {
            println!("{}: invalid ({})", entry.provider, operations.join(", "));
            for error in &entry.errors {
                println!("  - {error}");
            }
        }
    }

    if !any_valid {
        std::process::exit(1);
    }
}

/// How often abandoned authorization attempts are swept.
const STATE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the callback server until it stops, with the refresh worker and
/// state sweeper alongside it.
async fn serve(config: &plura_config::PluraConfig) -> Result<(), plura_core::PluraError> {
    let registry = Arc::new(build_registry(config));
    let states = Arc::new(OAuthStateMap::with_ttl(Duration::from_secs(
        config.oauth.state_ttl_secs,
    )));
    let store: Arc<dyn SessionStore> = Arc::new(InProcessStore::new());
    let bus: Arc<dyn NotificationBus> = Arc::new(LogBus);

    tokio::spawn(run_state_sweeper(
        Arc::clone(&states),
        STATE_SWEEP_INTERVAL,
    ));

    let (scheduler, rx) = TokioScheduler::new();
    let tx = scheduler.job_sender();
    let scheduler: Arc<dyn JobScheduler> = Arc::new(scheduler);
    let refresher = Arc::new(RefreshScheduler::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        scheduler,
    ));
    tokio::spawn(run_refresh_worker(Arc::clone(&refresher), tx, rx));

    let state = CallbackState::new(registry, states, store, refresher, bus);
    start_server(
        &CallbackServerConfig {
            host: config.callback.host.clone(),
            port: config.callback.port,
        },
        state,
    )
    .await
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = plura_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.callback.port, 8477);
    }
}
