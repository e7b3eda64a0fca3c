//! Command-line interface for tictactoe_service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tic-tac-toe game service with persistence and an AI opponent
#[derive(Parser, Debug)]
#[command(name = "tictactoe_service")]
#[command(about = "Tic-tac-toe game service over REST", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST server (applies pending migrations first)
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config and BIND_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["tictactoe_service", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, host, port } => {
                assert!(config.is_none());
                assert!(host.is_none());
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_migrate_with_config() {
        let cli =
            Cli::try_parse_from(["tictactoe_service", "migrate", "-c", "service.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Migrate { config: Some(ref path) } if path == &PathBuf::from("service.toml")
        ));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tictactoe_service"]).is_err());
    }
}
