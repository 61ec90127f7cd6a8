//! ZETDC top-up CLI
//!
//! Runs the pricing API as a long-lived service, or answers one-off
//! questions from the terminal.
//!
//! ```sh
//! # Run the API with default config (~/.config/zetdc-topup/config.toml)
//! topup-service
//!
//! # Units for a few payment amounts
//! topup-service estimate 5 20 100
//!
//! # Follow a manual token recharge until the backend finishes with it
//! topup-service watch-recharge 42
//!
//! # Validate config without starting
//! topup-service --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};

use zetdc_topup::application::recharge::{allocations, RechargeWatcher};
use zetdc_topup::config::AppConfig;
use zetdc_topup::domain::RechargeStatus;
use zetdc_topup::infrastructure::BackendClient;
use zetdc_topup::server::{init_tracing, ServerHandle, ServerOptions};
use zetdc_topup::shared::PollOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "topup-service",
    version,
    about = "Prepaid electricity pricing API and recharge tools",
    long_about = "Converts payment amounts into kWh unit estimates using the \
                  cumulative ZETDC tariff, and follows recharge tokens through \
                  the top-up backend.\n\n\
                  Default config: ~/.config/zetdc-topup/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "TOPUP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the pricing REST API (default).
    Serve,
    /// Print unit estimates for one or more payment amounts.
    Estimate {
        #[arg(required = true, allow_negative_numbers = true)]
        amounts: Vec<Decimal>,
    },
    /// Print the active tariff schedule.
    Schedule,
    /// Poll a manual recharge until it is applied or rejected.
    WatchRecharge { id: i64 },
    /// Trigger an auto-recharge run and wait for its events.
    AutoRecharge,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(zetdc_topup::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => {
            eprintln!("❌ Invalid configuration in {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    info!("Configuration: {}", config_path.display());

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        let pricing = match config.pricing_service() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        };
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Tiers       : {}", pricing.schedule().tiers().len());
        println!(
            "   Rate        : 1 {} = {} {}",
            pricing.input_currency(),
            pricing.rate().value(),
            pricing.billing_currency()
        );
        println!("   Backend     : {}", config.backend.base_url);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Estimate { amounts } => {
            let pricing = config.pricing_service()?;
            for amount in amounts {
                match pricing.estimate(amount) {
                    Some(units) => println!(
                        "{} {} ≈ {} kWh",
                        amount,
                        pricing.input_currency(),
                        units
                    ),
                    None => println!("{} {}: no estimate", amount, pricing.input_currency()),
                }
            }
            Ok(())
        }
        Command::Schedule => {
            let pricing = config.pricing_service()?;
            println!(
                "{:>8}  {:>14}  (1 {} = {} {})",
                "kWh",
                pricing.billing_currency(),
                pricing.input_currency(),
                pricing.rate().value(),
                pricing.billing_currency()
            );
            for tier in pricing.schedule().tiers() {
                println!("{:>8}  {:>14}", tier.cumulative_units, tier.cumulative_cost);
            }
            Ok(())
        }
        Command::WatchRecharge { id } => {
            let watcher = watcher(&config)?;
            match watcher.watch_manual(id).await? {
                PollOutcome::Completed { value, attempts } => {
                    println!("Recharge {} is {} after {} checks", id, value.status, attempts);
                    if value.status == RechargeStatus::Success {
                        if let Some(units) = value.units {
                            println!("   Units: {} kWh", units);
                        }
                    } else {
                        println!("   Reason: {}", value.reason());
                    }
                }
                PollOutcome::TimedOut { attempts, .. } => {
                    println!(
                        "Recharge {} is still being verified after {} checks; check again later",
                        id, attempts
                    );
                }
            }
            Ok(())
        }
        Command::AutoRecharge => {
            let watcher = watcher(&config)?;
            match watcher.run_auto_recharge().await? {
                PollOutcome::Completed { value, .. } => {
                    for event in &value {
                        println!("Event {}: {}", event.id, event.status);
                    }
                    for allocation in allocations(&value) {
                        println!("   Token for event {}: {}", allocation.event_id, allocation.token);
                    }
                }
                PollOutcome::TimedOut { last, .. } => {
                    let pending = last.map_or(0, |events| events.len());
                    println!(
                        "Auto recharge still running ({} new events so far); check again later",
                        pending
                    );
                }
            }
            Ok(())
        }
    }
}

fn watcher(config: &AppConfig) -> Result<RechargeWatcher, Box<dyn std::error::Error>> {
    let client = BackendClient::new(&config.backend)?;
    Ok(RechargeWatcher::new(
        Arc::new(client),
        config.polling.manual(),
        config.polling.auto(),
    ))
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let handle = match ServerHandle::start(ServerOptions { config }).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
