//! Duplicate reconciliation
//!
//! Products are matched by name. When a name already exists, the record with
//! the later declared `updated_at` wins; on a tie the incoming record wins.
//! Arrival order and wall-clock time play no part.

use crate::database::ProductStore;
use crate::error::{InventoryError, Result};
use crate::models::{Product, ProductRecord};
use std::fmt;

/// What [`reconcile`] did with an incoming record
#[derive(Debug)]
pub enum Outcome {
    /// No product had this name; a new one was created
    Inserted(i64),
    /// The existing product was overwritten
    Updated(i64),
    /// The existing product is newer; nothing changed
    SkippedOlder,
    /// The store failed
    Rejected(InventoryError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Inserted(id) => write!(f, "inserted as product {}", id),
            Outcome::Updated(id) => write!(f, "updated product {}", id),
            Outcome::SkippedOlder => write!(f, "skipped, a more recent entry exists"),
            Outcome::Rejected(e) => write!(f, "rejected: {}", e),
        }
    }
}

/// Whether `incoming` should replace `existing`
pub fn incoming_wins(incoming: &ProductRecord, existing: &Product) -> bool {
    incoming.updated_at >= existing.updated_at
}

/// Inserts, overwrites or discards `incoming` depending on what is stored.
///
/// The lookup and the write run in one transaction.
pub fn reconcile(store: &ProductStore, incoming: &ProductRecord) -> Outcome {
    match try_reconcile(store, incoming) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::debug!("Could not store '{}': {}", incoming.name, e);
            Outcome::Rejected(e)
        }
    }
}

fn try_reconcile(store: &ProductStore, incoming: &ProductRecord) -> Result<Outcome> {
    let tx = store.begin()?;

    let outcome = match store.find_by_name(&incoming.name)? {
        None => Outcome::Inserted(store.create_record(incoming)?),
        Some(existing) if incoming_wins(incoming, &existing) => {
            store.update(
                existing.id,
                incoming.quantity,
                incoming.price,
                incoming.updated_at,
            )?;
            Outcome::Updated(existing.id)
        }
        Some(existing) => {
            log::debug!(
                "Keeping '{}': stored {} is newer than incoming {}",
                existing.name,
                existing.updated_at,
                incoming.updated_at
            );
            Outcome::SkippedOlder
        }
    };

    tx.commit()?;
    log::debug!("'{}' {}", incoming.name, outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn record(name: &str, quantity: u32, price: i64, updated_at: NaiveDateTime) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            quantity,
            price,
            updated_at,
        }
    }

    #[test]
    fn new_name_is_inserted() {
        let store = ProductStore::open_in_memory().unwrap();
        let outcome = reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));

        let id = match outcome {
            Outcome::Inserted(id) => id,
            other => panic!("expected insert, got {other:?}"),
        };
        let stored = store.find_by_id(id).unwrap();
        assert_eq!(stored.price, 500);
        assert_eq!(stored.quantity, 10);
    }

    #[test]
    fn newer_record_overwrites() {
        let store = ProductStore::open_in_memory().unwrap();
        reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));
        let outcome = reconcile(&store, &record("Widget", 20, 600, day(2020, 1, 2)));

        let id = match outcome {
            Outcome::Updated(id) => id,
            other => panic!("expected update, got {other:?}"),
        };
        let stored = store.find_by_id(id).unwrap();
        assert_eq!(stored.quantity, 20);
        assert_eq!(stored.price, 600);
        assert_eq!(stored.updated_at, day(2020, 1, 2));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn older_record_is_skipped() {
        let store = ProductStore::open_in_memory().unwrap();
        reconcile(&store, &record("Widget", 20, 600, day(2020, 1, 2)));
        let before = store.find_by_name("Widget").unwrap().unwrap();

        let outcome = reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));
        assert!(matches!(outcome, Outcome::SkippedOlder));
        assert_eq!(store.find_by_name("Widget").unwrap().unwrap(), before);
    }

    #[test]
    fn equal_dates_favor_incoming() {
        let store = ProductStore::open_in_memory().unwrap();
        reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));
        let outcome = reconcile(&store, &record("Widget", 3, 999, day(2020, 1, 1)));

        assert!(matches!(outcome, Outcome::Updated(_)));
        let stored = store.find_by_name("Widget").unwrap().unwrap();
        assert_eq!(stored.quantity, 3);
        assert_eq!(stored.price, 999);
    }

    #[test]
    fn update_keeps_id_and_name() {
        let store = ProductStore::open_in_memory().unwrap();
        let first = match reconcile(&store, &record("Widget", 1, 1, day(2020, 1, 1))) {
            Outcome::Inserted(id) => id,
            other => panic!("expected insert, got {other:?}"),
        };
        reconcile(&store, &record("Gadget", 1, 1, day(2020, 1, 1)));
        let outcome = reconcile(&store, &record("Widget", 2, 2, day(2021, 1, 1)));

        assert!(matches!(outcome, Outcome::Updated(id) if id == first));
        assert_eq!(store.find_by_id(first).unwrap().name, "Widget");
    }

    #[test]
    fn storage_failure_is_rejected() {
        let store = ProductStore::open_in_memory().unwrap();
        // Price CHECK constraint only trips if parsing is bypassed
        let outcome = reconcile(&store, &record("Broken", 1, -5, day(2020, 1, 1)));
        assert!(matches!(
            outcome,
            Outcome::Rejected(InventoryError::Database(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn reconcile_inside_caller_transaction() {
        let store = ProductStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();

        let inserted = reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));
        assert!(matches!(inserted, Outcome::Inserted(_)), "got {inserted:?}");
        let updated = reconcile(&store, &record("Widget", 20, 600, day(2020, 1, 2)));
        assert!(matches!(updated, Outcome::Updated(_)), "got {updated:?}");

        tx.commit().unwrap();
        assert_eq!(store.find_by_name("Widget").unwrap().unwrap().quantity, 20);
    }

    #[test]
    fn caller_rollback_discards_reconciled_rows() {
        let store = ProductStore::open_in_memory().unwrap();
        {
            let _tx = store.begin().unwrap();
            let outcome = reconcile(&store, &record("Widget", 10, 500, day(2020, 1, 1)));
            assert!(matches!(outcome, Outcome::Inserted(_)));
        }
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn incoming_wins_compares_declared_dates() {
        let existing = Product {
            id: 1,
            name: "Widget".to_string(),
            quantity: 1,
            price: 1,
            updated_at: day(2020, 6, 1),
        };
        assert!(incoming_wins(&record("Widget", 1, 1, day(2020, 6, 2)), &existing));
        assert!(incoming_wins(&record("Widget", 1, 1, day(2020, 6, 1)), &existing));
        assert!(!incoming_wins(&record("Widget", 1, 1, day(2020, 5, 31)), &existing));
    }
}
