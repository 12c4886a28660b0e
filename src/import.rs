//! Bulk import of inventory CSV files
//!
//! Rows are read lazily and each one goes through parsing and reconciliation
//! on its own. A bad row is recorded in the report and the import moves on.

use crate::database::ProductStore;
use crate::error::{InventoryError, Result};
use crate::models::RawRecord;
use crate::reconcile::{reconcile, Outcome};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::Path;

/// Lazy iterator over the rows of an inventory CSV.
///
/// Not restartable; read the source again for a fresh pass.
pub struct RawRecords<R> {
    inner: csv::DeserializeRecordsIntoIter<R, RawRecord>,
}

impl<R: io::Read> RawRecords<R> {
    /// Reads rows from any byte source with a header line
    pub fn from_reader(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self {
            inner: reader.into_deserialize(),
        }
    }
}

impl<R: io::Read> Iterator for RawRecords<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|row| row.map_err(InventoryError::from))
    }
}

/// Opens an inventory CSV with the columns
/// `product_name, product_quantity, product_price, date_updated`
pub fn read_records(path: impl AsRef<Path>) -> Result<RawRecords<File>> {
    let file = File::open(path.as_ref())?;
    Ok(RawRecords::from_reader(file))
}

/// A row that did not make it into the store
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based data row, header excluded
    pub row: usize,
    pub product_name: Option<String>,
    pub reason: String,
}

/// Counts of what happened to each row of an import
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_older: usize,
    pub rejected: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    /// Total rows seen
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.skipped_older + self.rejected
    }

    fn reject(&mut self, row: usize, product_name: Option<String>, reason: &InventoryError) {
        log::debug!("Row {} rejected: {}", row, reason);
        self.rejected += 1;
        self.failures.push(RowFailure {
            row,
            product_name,
            reason: reason.to_string(),
        });
    }
}

/// Feeds every row through parsing and [`reconcile`].
///
/// Never stops early: decode errors, parse errors and storage errors are all
/// counted as rejected rows.
pub fn import_all<I>(store: &ProductStore, rows: I) -> ImportReport
where
    I: IntoIterator<Item = Result<RawRecord>>,
{
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;
        let raw = match row {
            Ok(raw) => raw,
            Err(e) => {
                report.reject(row_number, None, &e);
                continue;
            }
        };

        let record = match raw.parse() {
            Ok(record) => record,
            Err(e) => {
                report.reject(row_number, Some(raw.product_name), &InventoryError::from(e));
                continue;
            }
        };

        match reconcile(store, &record) {
            Outcome::Inserted(_) => report.inserted += 1,
            Outcome::Updated(_) => report.updated += 1,
            Outcome::SkippedOlder => report.skipped_older += 1,
            Outcome::Rejected(e) => report.reject(row_number, Some(record.name), &e),
        }
    }

    log::info!(
        "Import finished: {} inserted, {} updated, {} skipped (older), {} rejected",
        report.inserted,
        report.updated,
        report.skipped_older,
        report.rejected
    );
    report
}

/// Imports a CSV file. Only failing to open the file is an error.
pub fn import_csv(store: &ProductStore, path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    log::info!("Importing products from {}", path.display());
    let rows = read_records(path)?;
    Ok(import_all(store, rows))
}
