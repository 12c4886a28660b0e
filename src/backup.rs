//! CSV backup of the whole store

use crate::database::ProductStore;
use crate::error::Result;
use crate::models::BackupRow;
use std::io;
use std::path::Path;

/// Writes every product, ordered by id, as CSV with the columns
/// `product_name, product_price, product_quantity, date_updated`.
///
/// Returns the number of products written.
pub fn write_backup<W: io::Write>(store: &ProductStore, writer: W) -> Result<usize> {
    let products = store.list_all()?;
    let mut wtr = csv::Writer::from_writer(writer);

    if products.is_empty() {
        wtr.write_record(["product_name", "product_price", "product_quantity", "date_updated"])?;
    }
    for product in &products {
        wtr.serialize(BackupRow::from(product))?;
    }
    wtr.flush()?;
    Ok(products.len())
}

/// Writes the backup to `path`, replacing any previous file
pub fn export_backup(store: &ProductStore, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let count = write_backup(store, file)?;
    log::info!("Backed up {} products to {}", count, path.display());
    Ok(count)
}
