//! # CLI
//!
//! This module defines the command-line interface of `syncwire` using `clap`.
//!
//! Headers and timeouts can also come from a JSON settings file (`--config`); flags
//! given on the command line win over the file.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "syncwire", version, about = "Bidirectional sync client")]
pub struct Cli {
    /// The sync server URL (e.g. http://10.0.2.2:5005)
    pub url: String,

    /// Path to a JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Auth token sent in the `token` header (may be empty)
    #[arg(long)]
    pub token: Option<String>,

    /// Device identifier sent in the `deviceid` header
    #[arg(long)]
    pub device_id: Option<String>,

    /// User identifier sent in the `userid` header
    #[arg(long)]
    pub user_id: Option<String>,

    /// Maximum idle time between server messages, 0 disables it
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,

    /// Maximum time a send may wait on backpressure, 0 disables it
    #[arg(long)]
    pub write_timeout_secs: Option<u64>,

    /// Deadline for the whole call, 0 disables it
    #[arg(long)]
    pub call_timeout_secs: Option<u64>,

    /// Log every envelope sent and every message received
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Send a CreateCounter action, then print server messages until the stream ends
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// syncwire http://10.0.2.2:5005 --device-id 55 --user-id 555 send-counter --id 54 --name Counter --value 2
    /// ```
    SendCounter {
        /// Correlation id of the action
        #[arg(long, default_value = "564564")]
        correlation_id: String,
        #[arg(long, default_value_t = 54)]
        id: i64,
        #[arg(long, default_value = "Counter")]
        name: String,
        #[arg(long, default_value_t = 2)]
        value: i32,
    },

    /// Print server messages until the stream ends or Ctrl-C is pressed
    Listen,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_counter_defaults_match_the_reference_action() {
        let cli = Cli::try_parse_from([
            "syncwire",
            "http://localhost:5005",
            "--device-id",
            "55",
            "--user-id",
            "555",
            "send-counter",
        ])
        .unwrap();

        assert_eq!(cli.url, "http://localhost:5005");
        assert_eq!(cli.device_id.as_deref(), Some("55"));
        assert_eq!(
            cli.command,
            Commands::SendCounter {
                correlation_id: "564564".to_string(),
                id: 54,
                name: "Counter".to_string(),
                value: 2,
            }
        );
    }

    #[test]
    fn connection_options_may_come_from_a_settings_file() {
        let cli = Cli::try_parse_from([
            "syncwire",
            "http://localhost:5005",
            "--config",
            "sync.json",
            "--verbose",
            "listen",
        ])
        .unwrap();

        assert_eq!(cli.device_id, None);
        assert_eq!(cli.config, Some(PathBuf::from("sync.json")));
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::Listen);
    }

    #[test]
    fn timeouts_must_be_numbers() {
        let result = Cli::try_parse_from([
            "syncwire",
            "http://localhost:5005",
            "--read-timeout-secs",
            "soon",
            "listen",
        ]);

        assert!(result.is_err());
    }
}
