//! Order form state and validated submissions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ledger::{LedgerRow, ProductCell};
use super::photo::Photo;
use super::reference::ReferenceList;

/// Errors that block a submission.
///
/// Checked in declaration order: required fields first, then the remarks rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Employee name, shop name or photo is absent.
    #[error("Please complete all required fields and upload a photo ({0} is missing).")]
    MissingRequiredField(&'static str),

    /// Nothing ordered, no stock recorded and no remarks given.
    #[error("If no quantity or stock is entered, remarks must be filled.")]
    MissingRemarks,

    /// A field failed to parse or is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl SubmissionError {
    /// Convenience constructor for [`SubmissionError::InvalidField`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Quantity ordered and stock counted for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub product: String,
    pub quantity: u32,
    pub stock_on_hand: u32,
}

impl ProductLine {
    /// A zeroed line for `product`.
    #[must_use]
    pub fn empty(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            quantity: 0,
            stock_on_hand: 0,
        }
    }
}

/// Submission in progress: everything the form collects except the photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub employee_name: String,
    pub distributor: String,
    pub shop_name: String,
    pub margin: Decimal,
    pub beat_area: String,
    pub order_date: NaiveDate,
    pub last_visited: NaiveDate,
    pub num_visits: u32,
    pub lines: Vec<ProductLine>,
    pub remarks: String,
}

impl OrderDraft {
    /// Upper bound for the margin percentage.
    pub const MAX_MARGIN: i64 = 100;

    /// Margin pre-filled on a fresh form.
    #[must_use]
    pub fn default_margin() -> Decimal {
        Decimal::new(20, 0)
    }

    /// A fresh, empty form for the given product list.
    ///
    /// Dates default to `today`, visits to 1, margin to 20, and every product
    /// quantity and stock to zero.
    #[must_use]
    pub fn reset(products: &ReferenceList, today: NaiveDate) -> Self {
        Self {
            employee_name: String::new(),
            distributor: String::new(),
            shop_name: String::new(),
            margin: Self::default_margin(),
            beat_area: String::new(),
            order_date: today,
            last_visited: today,
            num_visits: 1,
            lines: products.iter().map(ProductLine::empty).collect(),
            remarks: String::new(),
        }
    }

    /// True when every quantity and every stock-on-hand value is zero.
    #[must_use]
    pub fn has_no_counts(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.quantity == 0 && line.stock_on_hand == 0)
    }

    /// Validate the draft together with its photo.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` if the employee name, shop name or photo
    /// is absent (blank text counts as absent), then `MissingRemarks` if no
    /// counts were entered and remarks are blank.
    pub fn into_submission(self, photo: Option<Photo>) -> Result<OrderSubmission, SubmissionError> {
        if self.employee_name.trim().is_empty() {
            return Err(SubmissionError::MissingRequiredField("employee name"));
        }
        if self.shop_name.trim().is_empty() {
            return Err(SubmissionError::MissingRequiredField("shop name"));
        }
        let Some(photo) = photo.filter(|p| !p.bytes.is_empty()) else {
            return Err(SubmissionError::MissingRequiredField("photo"));
        };
        if self.has_no_counts() && self.remarks.trim().is_empty() {
            return Err(SubmissionError::MissingRemarks);
        }

        Ok(OrderSubmission { draft: self, photo })
    }
}

/// A validated submission, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSubmission {
    draft: OrderDraft,
    photo: Photo,
}

impl OrderSubmission {
    /// The validated form fields.
    #[must_use]
    pub const fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// The attached photo.
    #[must_use]
    pub const fn photo(&self) -> &Photo {
        &self.photo
    }

    /// Lines with a nonzero quantity, in product-list order.
    pub fn ordered_lines(&self) -> impl Iterator<Item = &ProductLine> {
        self.draft.lines.iter().filter(|line| line.quantity > 0)
    }

    /// Expand into ledger rows.
    ///
    /// One row per ordered product, or a single row with empty product
    /// columns when nothing was ordered.
    #[must_use]
    pub fn ledger_rows(&self, timestamp: &str, local_path: &str, remote_url: &str) -> Vec<LedgerRow> {
        let row = |product: Option<ProductCell>| LedgerRow {
            timestamp: timestamp.to_owned(),
            order_date: self.draft.order_date,
            employee_name: self.draft.employee_name.clone(),
            distributor: self.draft.distributor.clone(),
            shop_name: self.draft.shop_name.clone(),
            margin: self.draft.margin,
            beat_area: self.draft.beat_area.clone(),
            product,
            local_photo_path: local_path.to_owned(),
            remote_photo_url: remote_url.to_owned(),
            remarks: self.draft.remarks.clone(),
            last_visited: self.draft.last_visited,
            num_visits: self.draft.num_visits,
        };

        let rows: Vec<LedgerRow> = self
            .ordered_lines()
            .map(|line| {
                row(Some(ProductCell {
                    name: line.product.clone(),
                    quantity: line.quantity,
                    stock_on_hand: line.stock_on_hand,
                }))
            })
            .collect();

        if rows.is_empty() { vec![row(None)] } else { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::photo::PhotoKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
    }

    fn products() -> ReferenceList {
        ReferenceList::from_values(["Product A", "Product B", "Product C"])
    }

    fn photo() -> Photo {
        Photo {
            original_name: "shop.jpg".to_string(),
            kind: PhotoKind::Jpeg,
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn filled_draft() -> OrderDraft {
        let mut draft = OrderDraft::reset(&products(), today());
        draft.employee_name = "Asha".to_string();
        draft.distributor = "D1".to_string();
        draft.shop_name = "Blue Mart".to_string();
        draft
    }

    #[test]
    fn test_reset_is_fresh() {
        let draft = OrderDraft::reset(&products(), today());
        assert_eq!(draft.margin, Decimal::new(20, 0));
        assert_eq!(draft.num_visits, 1);
        assert_eq!(draft.lines.len(), 3);
        assert!(draft.has_no_counts());
        assert!(draft.shop_name.is_empty());
        assert_eq!(draft.order_date, today());
    }

    #[test]
    fn test_missing_fields_checked_in_order() {
        let mut draft = OrderDraft::reset(&products(), today());
        assert_eq!(
            draft.clone().into_submission(None),
            Err(SubmissionError::MissingRequiredField("employee name"))
        );

        draft.employee_name = "Asha".to_string();
        draft.shop_name = "   ".to_string();
        assert_eq!(
            draft.clone().into_submission(Some(photo())),
            Err(SubmissionError::MissingRequiredField("shop name"))
        );

        draft.shop_name = "Blue Mart".to_string();
        assert_eq!(
            draft.into_submission(None),
            Err(SubmissionError::MissingRequiredField("photo"))
        );
    }

    #[test]
    fn test_empty_photo_counts_as_missing() {
        let mut empty = photo();
        empty.bytes.clear();
        assert_eq!(
            filled_draft().into_submission(Some(empty)),
            Err(SubmissionError::MissingRequiredField("photo"))
        );
    }

    #[test]
    fn test_all_zero_requires_remarks() {
        let mut draft = filled_draft();
        draft.remarks = "  \n".to_string();
        assert_eq!(
            draft.clone().into_submission(Some(photo())),
            Err(SubmissionError::MissingRemarks)
        );

        draft.remarks = "store closed".to_string();
        assert!(draft.into_submission(Some(photo())).is_ok());
    }

    #[test]
    fn test_stock_only_needs_no_remarks() {
        let mut draft = filled_draft();
        if let Some(line) = draft.lines.get_mut(1) {
            line.stock_on_hand = 4;
        }
        let submission = draft.into_submission(Some(photo())).expect("valid");
        // Stock without an order still yields a single summary row
        let rows = submission.ledger_rows("20250602_101500", "images/x.jpg", "");
        assert_eq!(rows.len(), 1);
        assert!(rows.first().is_some_and(|r| r.product.is_none()));
    }

    #[test]
    fn test_one_row_per_ordered_product() {
        let mut draft = filled_draft();
        for (line, qty) in draft.lines.iter_mut().zip([5, 0, 2]) {
            line.quantity = qty;
            line.stock_on_hand = 1;
        }
        let submission = draft.into_submission(Some(photo())).expect("valid");
        let rows = submission.ledger_rows("20250602_101500", "images/x.jpg", "https://link");

        assert_eq!(rows.len(), 2);
        let names: Vec<&str> = rows
            .iter()
            .filter_map(|r| r.product.as_ref().map(|p| p.name.as_str()))
            .collect();
        assert_eq!(names, ["Product A", "Product C"]);
        assert!(rows.iter().all(|r| r.remote_photo_url == "https://link"));
    }
}
