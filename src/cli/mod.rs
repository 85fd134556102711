//! CLI module - Command-line interface for the smartfarm backend
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Smartfarm - greenhouse management backend
#[derive(Parser)]
#[command(name = "smartfarm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a user account
    CreateUser {
        /// Login name
        username: String,
        /// Contact email address
        #[arg(long)]
        email: String,
        /// Initial password
        #[arg(long)]
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["smartfarm"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_user_arguments() {
        let cli = Cli::try_parse_from([
            "smartfarm",
            "create-user",
            "root",
            "--email",
            "root@example.com",
            "--password",
            "changeme123",
            "--admin",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateUser {
                username, admin, ..
            }) => {
                assert_eq!(username, "root");
                assert!(admin);
            }
            _ => panic!("expected create-user"),
        }
    }
}
