//! Face Detect CLI - outline faces in uploaded images.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod detector;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Some(Commands::Detect(args)) => {
            commands::detect::run(&args.with_config(&config)).map(|outcome| {
                info!(
                    displayed = outcome.displayed,
                    faces = outcome.faces,
                    "Detection finished"
                );
                outcome.exit_code
            })
        }
        Some(Commands::Models(args)) => {
            commands::models::run(&args.with_config(&config)).map(|()| ExitCode::Success)
        }
        Some(Commands::Serve(args)) => {
            commands::serve::run(&args.with_config(&config)).map(|()| ExitCode::Success)
        }
        None => {
            let args = commands::serve::ServeArgs::default().with_config(&config);
            commands::serve::run(&args).map(|()| ExitCode::Success)
        }
    };

    let exit_code = result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::Error
    });

    exit_code.into()
}
