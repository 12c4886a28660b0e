//! Shelf Inventory - product stock database
//!
//! Imports product records from CSV into a local SQLite table, reconciles
//! duplicates by their declared update date, and offers an interactive menu
//! to view, add and back up products.

pub mod backup;
pub mod database;
pub mod error;
pub mod import;
pub mod models;
pub mod parsing;
pub mod reconcile;
pub mod shell;

pub use backup::{export_backup, write_backup};
pub use database::{ProductStore, StoreTransaction};
pub use error::{InventoryError, ParseError, Result};
pub use import::{import_all, import_csv, read_records, ImportReport, RawRecords, RowFailure};
pub use models::{Product, ProductRecord, RawRecord};
pub use reconcile::{reconcile, Outcome};
pub use shell::Shell;
