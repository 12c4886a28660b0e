//! Shelf Inventory - product stock database
//!
//! Loads `inventory.csv` into SQLite on startup, then runs the interactive menu.

use clap::{Parser, Subcommand};
use shelf_inventory::{export_backup, import_csv, ImportReport, ProductStore, Shell};
use std::path::{Path, PathBuf};

/// Product inventory database with CSV import and backup
#[derive(Parser, Debug)]
#[command(name = "shelf_inventory")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, default_value_t = default_db_path())]
    database: String,

    /// Inventory CSV imported on startup
    #[arg(long, global = true, default_value = "inventory.csv")]
    csv: PathBuf,

    /// Destination of the backup action (overwritten each time)
    #[arg(long, global = true, default_value = "backup_inventory.csv")]
    backup: PathBuf,

    /// Start the menu without importing the CSV first
    #[arg(long, default_value_t = false)]
    skip_import: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the CSV, print a summary and exit
    Import {
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the backup CSV and exit
    Backup,
}

/// Returns the default database path: ~/.local/share/shelf_inventory/inventory.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelf_inventory")
        .join("inventory.db")
        .to_string_lossy()
        .to_string()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);
    log::info!("Database path: {}", db_path.display());

    let store = match ProductStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        None => {
            if !args.skip_import {
                startup_import(&store, &args.csv);
            }
            run_shell(&store, &args.backup);
        }
        Some(Command::Import { json }) => match import_csv(&store, &args.csv) {
            Ok(report) => print_report(&report, json),
            Err(e) => {
                log::error!("Failed to import {}: {}", args.csv.display(), e);
                std::process::exit(1);
            }
        },
        Some(Command::Backup) => match export_backup(&store, &args.backup) {
            Ok(count) => println!(
                "Backed up {} products to {}",
                count,
                args.backup.display()
            ),
            Err(e) => {
                log::error!("Failed to write backup: {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Imports the CSV if it exists. A missing file is not an error on startup.
fn startup_import(store: &ProductStore, csv: &Path) {
    if !csv.exists() {
        log::warn!("{} not found, starting without import", csv.display());
        return;
    }
    match import_csv(store, csv) {
        Ok(report) => {
            for failure in &report.failures {
                log::warn!("Skipped row {}: {}", failure.row, failure.reason);
            }
        }
        Err(e) => log::error!("Failed to import {}: {}", csv.display(), e),
    }
}

fn run_shell(store: &ProductStore, backup: &Path) {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(store, backup, stdin.lock(), stdout.lock());
    if let Err(e) = shell.run() {
        log::error!("Session aborted: {}", e);
        std::process::exit(1);
    }
}

fn print_report(report: &ImportReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                log::error!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "Processed {} rows: {} inserted, {} updated, {} skipped (older), {} rejected",
        report.processed(),
        report.inserted,
        report.updated,
        report.skipped_older,
        report.rejected
    );
    for failure in &report.failures {
        println!("  row {}: {}", failure.row, failure.reason);
    }
}
