//! Product store backed by SQLite
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Each statement runs in autocommit mode unless the caller holds a
//! transaction from [`ProductStore::begin`], so every mutation is durable
//! once the call returns.

use crate::error::{InventoryError, Result};
use crate::models::{Product, ProductRecord};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PRODUCT_COLUMNS: &str = "id, name, quantity, price, updated_at";

/// SQLite resolves a repeated savepoint name to the innermost one
const SAVEPOINT_NAME: &str = "store_tx";

/// Owns the single database connection used by the whole program
pub struct ProductStore {
    conn: Connection,
}

impl ProductStore {
    /// Opens (or creates) the database file and initializes the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened database: {}", path.display());
        Self::from_connection(conn)
    }

    /// Fresh store that lives only as long as the value (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Starts a transaction on the store's connection.
    ///
    /// Store calls made while the returned guard is alive run inside it;
    /// dropping the guard without `commit()` rolls them back. Guards nest:
    /// an inner one becomes a savepoint of the outer transaction.
    pub fn begin(&self) -> Result<StoreTransaction<'_>> {
        self.conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME}"))?;
        Ok(StoreTransaction {
            conn: &self.conn,
            finished: false,
        })
    }

    /// Inserts a new product and returns its id.
    ///
    /// Fails with [`InventoryError::DuplicateName`] if the name is taken.
    pub fn create(
        &self,
        name: &str,
        quantity: u32,
        price: i64,
        updated_at: NaiveDateTime,
    ) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO products (name, quantity, price, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        match stmt.execute(params![name, quantity, price, updated_at]) {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                log::debug!("Created product {} '{}'", id, name);
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => Err(InventoryError::DuplicateName(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Inserts a parsed record (see [`ProductStore::create`])
    pub fn create_record(&self, record: &ProductRecord) -> Result<i64> {
        self.create(
            &record.name,
            record.quantity,
            record.price,
            record.updated_at,
        )
    }

    /// Looks a product up by its exact name
    pub fn find_by_name(&self, name: &str) -> Result<Option<Product>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1"
        ))?;
        Ok(stmt.query_row(params![name], product_from_row).optional()?)
    }

    /// Looks a product up by id, failing with [`InventoryError::NotFound`]
    pub fn find_by_id(&self, id: i64) -> Result<Product> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], product_from_row)
            .optional()?
            .ok_or(InventoryError::NotFound(id))
    }

    /// Overwrites quantity, price and update date. Name and id never change.
    pub fn update(
        &self,
        id: i64,
        quantity: u32,
        price: i64,
        updated_at: NaiveDateTime,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE products SET quantity = ?1, price = ?2, updated_at = ?3 WHERE id = ?4",
            params![quantity, price, updated_at, id],
        )?;
        if changed == 0 {
            return Err(InventoryError::NotFound(id));
        }
        log::debug!("Updated product {}", id);
        Ok(())
    }

    /// Highest id currently in the store
    pub fn latest_id(&self) -> Result<i64> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM products", [], |row| row.get(0))?;
        id.ok_or(InventoryError::EmptyStore)
    }

    /// All products ordered by id
    pub fn list_all(&self) -> Result<Vec<Product>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"))?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    /// Number of products in the store
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Guard returned by [`ProductStore::begin`]
pub struct StoreTransaction<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl StoreTransaction<'_> {
    /// Makes the changes permanent, or hands them to the enclosing
    /// transaction when nested
    pub fn commit(mut self) -> Result<()> {
        self.conn
            .execute_batch(&format!("RELEASE {SAVEPOINT_NAME}"))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let rollback = format!("ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME}");
        if let Err(e) = self.conn.execute_batch(&rollback) {
            log::warn!("Failed to roll back transaction: {}", e);
        }
    }
}

/// Creates the `products` table if it does not already exist.
///
/// `AUTOINCREMENT` keeps ids from being reused.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS products (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            quantity    INTEGER NOT NULL CHECK (quantity >= 0),
            price       INTEGER NOT NULL CHECK (price >= 0),
            updated_at  TEXT NOT NULL
        );",
    )?;
    log::debug!("Database schema initialized");
    Ok(())
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        price: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
