//! Quantum trader - main entry point
//!
//! This binary provides six subcommands:
//! - run: Run one trading cycle on a network or all networks
//! - analyze: Analyze a single pair without trading
//! - trade: Analyze and trade a single pair, optionally with a fixed amount
//! - performance: Summarize the trade-history log
//! - balance: Show wallet balances
//! - test: Execute a Bell circuit on the configured backend

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "quantum-trader")]
#[command(about = "Regime-aware quantum signal trading pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "configs/default.json")]
    config: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one trading cycle
    Run {
        /// Network to trade, or "all"
        #[arg(default_value = "all")]
        network: String,
    },

    /// Analyze a pair without trading
    Analyze {
        /// Network the pair trades on
        #[arg(short, long)]
        network: String,

        /// Base token symbol. E.g., "ETH"
        #[arg(short, long)]
        base: String,

        /// Quote token symbol. E.g., "USDC"
        #[arg(short, long)]
        quote: String,
    },

    /// Analyze and trade a single pair
    Trade {
        /// Network the pair trades on
        #[arg(short, long)]
        network: String,

        /// Base token symbol. E.g., "ETH"
        #[arg(short, long)]
        base: String,

        /// Quote token symbol. E.g., "USDC"
        #[arg(short, long)]
        quote: String,

        /// Fixed amount of the source token (default: confidence-scaled)
        #[arg(short, long)]
        amount: Option<f64>,
    },

    /// Show performance metrics from the trade history
    Performance,

    /// Show wallet balances
    Balance {
        /// Only this network (default: all wallet networks)
        #[arg(short, long)]
        network: Option<String>,
    },

    /// Execute a Bell circuit and print the outcome
    Test {
        /// Number of shots
        #[arg(short, long)]
        shots: Option<u32>,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console goes to stderr so stdout stays clean JSON
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Run { .. } => "run",
        Commands::Analyze { .. } => "analyze",
        Commands::Trade { .. } => "trade",
        Commands::Performance => "performance",
        Commands::Balance { .. } => "balance",
        Commands::Test { .. } => "test",
    };

    setup_logging(cli.verbose, command_name)?;
    dotenv::dotenv().ok();

    match cli.command {
        Commands::Run { network } => commands::run::run(&cli.config, &network),
        Commands::Analyze {
            network,
            base,
            quote,
        } => commands::analyze::run(&cli.config, &network, &base, &quote),
        Commands::Trade {
            network,
            base,
            quote,
            amount,
        } => commands::trade::run(&cli.config, &network, &base, &quote, amount),
        Commands::Performance => commands::performance::run(&cli.config),
        Commands::Balance { network } => commands::balance::run(&cli.config, network.as_deref()),
        Commands::Test { shots } => commands::test_circuit::run(&cli.config, shots),
    }
}
