//! Rows appended to the order ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Column order of every ledger row.
pub const LEDGER_COLUMNS: [&str; 15] = [
    "Timestamp",
    "Order Date",
    "Employee Name",
    "Distributor",
    "Shop Name",
    "Margin",
    "Beat Area",
    "Product",
    "Quantity",
    "Stock on Hand",
    "Local Photo Path",
    "Remote Photo URL",
    "Remarks",
    "Last Visited Date",
    "Number of Visits",
];

/// Product columns of a row; absent on the summary row of an order with no
/// ordered products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCell {
    pub name: String,
    pub quantity: u32,
    pub stock_on_hand: u32,
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub timestamp: String,
    pub order_date: NaiveDate,
    pub employee_name: String,
    pub distributor: String,
    pub shop_name: String,
    pub margin: Decimal,
    pub beat_area: String,
    pub product: Option<ProductCell>,
    pub local_photo_path: String,
    pub remote_photo_url: String,
    pub remarks: String,
    pub last_visited: NaiveDate,
    pub num_visits: u32,
}

/// A single ledger cell.
///
/// Serializes as a JSON string or number, which is the shape spreadsheet
/// append APIs expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerValue {
    Text(String),
    Number(u32),
    Empty,
}

impl Serialize for LedgerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(n) => serializer.serialize_u32(*n),
            Self::Empty => serializer.serialize_str(""),
        }
    }
}

impl LedgerRow {
    /// The 15 cells in [`LEDGER_COLUMNS`] order.
    #[must_use]
    pub fn values(&self) -> [LedgerValue; 15] {
        let (product, quantity, stock) = self.product.as_ref().map_or(
            (LedgerValue::Empty, LedgerValue::Empty, LedgerValue::Empty),
            |p| {
                (
                    LedgerValue::Text(p.name.clone()),
                    LedgerValue::Number(p.quantity),
                    LedgerValue::Number(p.stock_on_hand),
                )
            },
        );

        [
            LedgerValue::Text(self.timestamp.clone()),
            LedgerValue::Text(self.order_date.to_string()),
            LedgerValue::Text(self.employee_name.clone()),
            LedgerValue::Text(self.distributor.clone()),
            LedgerValue::Text(self.shop_name.clone()),
            LedgerValue::Text(self.margin.normalize().to_string()),
            LedgerValue::Text(self.beat_area.clone()),
            product,
            quantity,
            stock,
            LedgerValue::Text(self.local_photo_path.clone()),
            LedgerValue::Text(self.remote_photo_url.clone()),
            LedgerValue::Text(self.remarks.clone()),
            LedgerValue::Text(self.last_visited.to_string()),
            LedgerValue::Number(self.num_visits),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product: Option<ProductCell>) -> LedgerRow {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        LedgerRow {
            timestamp: "20250602_101500".to_string(),
            order_date: date,
            employee_name: "Asha".to_string(),
            distributor: "D2".to_string(),
            shop_name: "Blue Mart".to_string(),
            margin: Decimal::new(125, 1),
            beat_area: "North".to_string(),
            product,
            local_photo_path: "images/Blue_Mart_20250602_101500.jpg".to_string(),
            remote_photo_url: String::new(),
            remarks: String::new(),
            last_visited: date,
            num_visits: 2,
        }
    }

    #[test]
    fn test_values_column_order() {
        let values = row(Some(ProductCell {
            name: "Product A".to_string(),
            quantity: 5,
            stock_on_hand: 2,
        }))
        .values();

        let json = serde_json::to_value(values).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([
                "20250602_101500",
                "2025-06-02",
                "Asha",
                "D2",
                "Blue Mart",
                "12.5",
                "North",
                "Product A",
                5,
                2,
                "images/Blue_Mart_20250602_101500.jpg",
                "",
                "",
                "2025-06-02",
                2
            ])
        );
    }

    #[test]
    fn test_summary_row_has_empty_product_cells() {
        let values = row(None).values();
        assert_eq!(values.get(7), Some(&LedgerValue::Empty));
        assert_eq!(values.get(8), Some(&LedgerValue::Empty));
        assert_eq!(values.get(9), Some(&LedgerValue::Empty));
        assert_eq!(LEDGER_COLUMNS.len(), values.len());
    }
}
