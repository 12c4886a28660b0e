use crate::error::ParseError;
use crate::parsing::{
    format_date, format_price, parse_date, parse_price, parse_quantity, DATE_LAYOUT,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A product as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    /// Price in cents
    pub price: i64,
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Price rendered as `$#.##`
    pub fn price_display(&self) -> String {
        format_price(self.price)
    }

    /// Update date rendered as `MM/DD/YYYY`
    pub fn date_display(&self) -> String {
        format_date(self.updated_at)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}  |  NAME: {}  |  QUANTITY: {}  |  PRICE: {}  |  Date Updated: {}",
            self.id,
            self.name,
            self.quantity,
            self.price_display(),
            self.date_display()
        )
    }
}

/// An incoming product that passed parsing and is ready to be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub quantity: u32,
    /// Price in cents
    pub price: i64,
    pub updated_at: NaiveDateTime,
}

/// One row of an inventory CSV, fields still as text
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRecord {
    pub product_name: String,
    pub product_quantity: String,
    pub product_price: String,
    pub date_updated: String,
}

impl RawRecord {
    /// Parses every field, failing on the first one that is invalid
    pub fn parse(&self) -> Result<ProductRecord, ParseError> {
        let name = self.product_name.trim();
        if name.is_empty() {
            return Err(ParseError::format("product name", name, "a non-empty name"));
        }

        Ok(ProductRecord {
            name: name.to_string(),
            quantity: parse_quantity(&self.product_quantity)?,
            price: parse_price(&self.product_price)?,
            updated_at: parse_date(&self.date_updated, DATE_LAYOUT)?,
        })
    }
}

/// Row layout of the backup CSV. Column order differs from the import file.
#[derive(Debug, Serialize)]
pub(crate) struct BackupRow<'a> {
    pub product_name: &'a str,
    pub product_price: String,
    pub product_quantity: u32,
    pub date_updated: String,
}

impl<'a> From<&'a Product> for BackupRow<'a> {
    fn from(product: &'a Product) -> Self {
        BackupRow {
            product_name: &product.name,
            product_price: product.price_display(),
            product_quantity: product.quantity,
            date_updated: product.date_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(name: &str, qty: &str, price: &str, date: &str) -> RawRecord {
        RawRecord {
            product_name: name.to_string(),
            product_quantity: qty.to_string(),
            product_price: price.to_string(),
            date_updated: date.to_string(),
        }
    }

    #[test]
    fn raw_record_parses_all_fields() {
        let record = raw("Widget", "10", "$5.00", "01/01/2020").parse().unwrap();
        assert_eq!(record.name, "Widget");
        assert_eq!(record.quantity, 10);
        assert_eq!(record.price, 500);
        assert_eq!(
            record.updated_at,
            NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn raw_record_rejects_blank_name() {
        let err = raw("   ", "1", "$1.00", "01/01/2020").parse().unwrap_err();
        assert!(matches!(err, ParseError::Format { field: "product name", .. }));
    }

    #[test]
    fn raw_record_reports_price_precision() {
        let err = raw("Widget", "1", "$1.001", "01/01/2020").parse().unwrap_err();
        assert!(matches!(err, ParseError::Precision(_)));
    }

    #[test]
    fn product_display_matches_menu_layout() {
        let product = Product {
            id: 3,
            name: "Widget".to_string(),
            quantity: 20,
            price: 600,
            updated_at: NaiveDate::from_ymd_opt(2020, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        assert_eq!(
            product.to_string(),
            "ID: 3  |  NAME: Widget  |  QUANTITY: 20  |  PRICE: $6.00  |  Date Updated: 01/02/2020"
        );
    }
}
