// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - a shared WhatsApp inbox and bulk sender.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use switchboard::serve;
use switchboard_config::SwitchboardConfig;

/// Switchboard - a shared WhatsApp inbox and bulk sender.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook receiver and operator API.
    Serve,
    /// Clear every conversation for every running instance.
    Reset,
    /// Print the last recorded bulk job.
    BulkStatus,
    /// Validate configuration and report missing credentials.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => switchboard_config::load_and_validate_path(path),
        None => switchboard_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            switchboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.logging.level, config.logging.json);
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Reset) => match serve::run_reset(&config).await {
            Ok(epoch) => println!("conversations cleared (reset epoch {epoch})"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::BulkStatus) => match serve::run_bulk_status(&config).await {
            Ok(job) => match serde_json::to_string_pretty(&job) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::CheckConfig) => check_config(&config),
        None => {
            println!("switchboard: use --help for available commands");
        }
    }
}

fn check_config(config: &SwitchboardConfig) {
    println!("configuration OK");
    println!(
        "  server: {}:{}, storage: {:?}",
        config.server.host, config.server.port, config.storage.backend
    );
    let missing = config.whatsapp.missing_credentials();
    if !missing.is_empty() {
        println!("  warning: missing whatsapp settings: {}", missing.join(", "));
    }
    if config.server.api_token.is_none() {
        println!("  warning: server.api_token is not set, operator APIs are disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["switchboard", "serve", "--config", "/tmp/s.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }

    #[test]
    fn cli_without_subcommand() {
        let cli = Cli::try_parse_from(["switchboard"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_kebab_case_subcommands() {
        let cli = Cli::try_parse_from(["switchboard", "bulk-status"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::BulkStatus)));
        let cli = Cli::try_parse_from(["switchboard", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }
}
