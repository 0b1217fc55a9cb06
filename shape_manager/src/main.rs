use clap::{Parser, Subcommand};
use colored::*;
use shape_manager::commands::config::ConfigFormat;
use shape_manager::commands::{self, run::RunOptions};
use shape_manager::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shapedisplay")]
#[command(about = "Drive a pin-array shape display")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the display until Esc, Ctrl+C or the time limit
    Run {
        /// Configuration file (.toml, .yaml or .yml)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Display to drive: inform, transform or cooperform
        #[arg(short = 'd', long = "display", value_name = "KIND")]
        display: Option<String>,

        /// Application that is current at startup
        #[arg(short = 'a', long = "app", value_name = "NAME")]
        app: Option<String>,

        /// Stop after this many seconds
        #[arg(long = "duration", value_name = "SECS")]
        duration: Option<f64>,

        /// Do not read keys from the terminal
        #[arg(long = "no-keyboard")]
        no_keyboard: bool,

        /// Seconds between status lines (0 disables them)
        #[arg(long = "status-interval", value_name = "SECS", default_value = "5")]
        status_interval: f64,

        /// Seed for the synthetic depth camera
        #[arg(long = "seed", default_value = "0")]
        seed: u64,
    },

    /// List the supported displays
    Displays,

    /// List the bundled applications and their keys
    Apps,

    /// Print the effective configuration, or write it to a file
    Config {
        /// Configuration file to start from (defaults otherwise)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Output format when printing
        #[arg(short = 'f', long = "format", value_enum, default_value = "toml")]
        format: ConfigFormat,

        /// Write to this file instead; format follows its extension
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run_command(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            config,
            display,
            app,
            duration,
            no_keyboard,
            status_interval,
            seed,
        } => commands::run::execute_run(RunOptions {
            config,
            display,
            app,
            duration,
            keyboard: !no_keyboard,
            status_interval,
            seed,
        }),
        Commands::Displays => commands::info::list_displays(),
        Commands::Apps => commands::info::list_applications(),
        Commands::Config {
            config,
            format,
            output,
        } => commands::config::execute_config(config, format, output),
    }
}
