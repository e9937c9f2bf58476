// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Command line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use crate::config::Config;
use crate::db::Db;
use crate::scanner::{self, ScanKind};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print debug-level log output.
    #[arg(short, long)]
    verbose: bool,
    /// Command to run. Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the catalog, run the startup scan, and keep the process alive on the configured
    /// schedule until interrupted.
    Serve,
    /// Open the catalog, run a single scan, and exit.
    Scan {
        /// Run a full rescan instead of an incremental one.
        #[arg(long)]
        full: bool,
    },
}

/// Main entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the database cannot be opened, or the
/// requested command fails. The caller is expected to print the error and exit with a non-zero
/// status, per §6's "exit code 0 on clean shutdown, non-zero with a single-line error on
/// config/DB-open failure" contract.
pub async fn main() -> crate::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("failed to initialize logging");

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };

    log::info!(target: "lms::cli", "starting up");

    let db_path = config
        .database
        .path
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lms.db"));
    let connection_count = config.database.connection_count.unwrap_or(4);
    let integrity_check = config.database.integrity_check.unwrap_or_default();
    let show_queries = config.database.show_queries.unwrap_or(false);
    let db = Arc::new(Db::open(&db_path, connection_count, integrity_check, show_queries)?);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Scan { full } => {
            let kind = if full { ScanKind::Full } else { ScanKind::Incremental };
            let stats = scanner::run_scan(&db, &config, kind)?;
            log::info!(target: "lms::scanner", "scan complete: {stats:?}");
            Ok(())
        }
        Commands::Serve => serve(db, config).await,
    }
}

/// Run the startup scan, then idle, re-scanning on the configured schedule, until the process
/// receives an interrupt signal.
async fn serve(db: Arc<Db>, config: Config) -> crate::Result<()> {
    {
        let db = Arc::clone(&db);
        let config = config.clone();
        tokio::task::spawn_blocking(move || scanner::run_scan(&db, &config, ScanKind::Incremental))
            .await
            .expect("scan task panicked")?;
    }

    log::info!(target: "lms::cli", "ready");
    tokio::signal::ctrl_c().await.map_err(crate::Error::Io)?;
    log::info!(target: "lms::cli", "shutting down");
    Ok(())
}
