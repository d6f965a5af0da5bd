//! # CLI
//!
//! This module defines the command-line interface of `grip-search` using `clap`.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "grip-search",
    version,
    about = "Serve a GA4GH Search API as a GRIPSource"
)]
pub struct Cli {
    /// Log output format. The level is taken from `RUST_LOG` (default `info`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the GRIPSource gRPC server
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// grip-search server config.yaml
    /// ```
    Server {
        /// Path to the proxy configuration (YAML or JSON)
        config: PathBuf,

        /// Listen on this port instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the tables of a search backend, one JSON object per line
    List {
        /// Base URL of the search API (e.g. http://localhost:8089/)
        base_url: String,
    },

    /// Generate a proxy configuration by introspecting a search backend
    ///
    /// The configuration is printed as YAML. A table's primary key is guessed as the
    /// property named `id`; tables without one are listed with no primary key and are not
    /// served until one is set.
    GenConfig {
        /// Base URL of the search API (e.g. http://localhost:8089/)
        base_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Full,
    Json,
}
