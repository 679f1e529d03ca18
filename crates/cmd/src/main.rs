// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod common;
mod spec;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "fsman")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge the backend to the state declared in a YAML spec file
    ///
    /// The file is a map, keyed by file system name, of lists of access
    /// point names. For example:
    ///
    ///     fs1:
    ///         - apX
    ///     fs2:
    ///         - apY
    ///         - apZ
    ///     fs3: []
    ///
    /// This ensures three file systems: the first with one access point,
    /// the second with two, the third with none.
    Apply {
        /// Path to the YAML spec file
        spec: PathBuf,
    },
    /// Print discovered file system and access point pairs, one per line
    Discover,
    /// Delete all managed mount endpoints, file systems, and access points
    DeleteAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Apply { spec } => commands::apply_command(spec).await,
        Commands::Discover => commands::discover_command().await,
        Commands::DeleteAll => commands::delete_all_command().await,
    }
}
