// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - a webhook-driven Twilio and SignalWire adapter.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use switchboard_config::{ConfigError, SwitchboardConfig};

/// Switchboard - a webhook-driven Twilio and SignalWire adapter.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Read this TOML file instead of the XDG search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway.
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Load and validate configuration, then report what is configured.
    Check,
}

fn load(path: Option<&PathBuf>) -> Result<SwitchboardConfig, Vec<ConfigError>> {
    match path {
        Some(path) => switchboard_config::load_and_validate_path(path),
        None => switchboard_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            switchboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("switchboard serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigCommands::Check,
        }) => {
            println!("switchboard: configuration is valid");
            println!(
                "  listening on {}:{}{}",
                config.server.host, config.server.port, config.server.webhook_path
            );
            println!("  mode: {}", config.app.mode);
            println!("  twilio: {}", configured(config.twilio.is_configured()));
            println!(
                "  signalwire: {}",
                configured(config.signalwire.is_configured())
            );
        }
        None => {
            println!("switchboard: use --help for available commands");
        }
    }
}

fn configured(yes: bool) -> &'static str {
    if yes { "configured" } else { "not configured" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_parses() {
        let cli = Cli::try_parse_from(["switchboard", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "switchboard",
            "config",
            "check",
            "--config",
            "/etc/switchboard/alt.toml",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Check
            })
        ));
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/switchboard/alt.toml"))
        );
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["switchboard", "shell"]).is_err());
    }
}
