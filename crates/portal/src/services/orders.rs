//! Order form workflow.
//!
//! Turns the submitted form fields into an [`OrderDraft`], applies the
//! per-employee restrictions from the reference data and validates the
//! result into an [`OrderSubmission`]. The HTTP handlers only move bytes in
//! and out; every rule lives here.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use field_orders_core::{
    OrderDraft, OrderSubmission, Photo, PhotoKind, ProductLine, ReferenceList, Role,
    SubmissionError,
};
use rust_decimal::Decimal;
use serde::Serialize;

use super::reference::ReferenceData;

/// Form field names shared by the handler, the template and the tests.
pub mod fields {
    pub const EMPLOYEE_NAME: &str = "employee_name";
    pub const DISTRIBUTOR: &str = "distributor";
    pub const SHOP_NAME: &str = "shop_name";
    pub const MARGIN: &str = "margin";
    pub const BEAT_AREA: &str = "beat_area";
    pub const ORDER_DATE: &str = "order_date";
    pub const LAST_VISITED: &str = "last_visited";
    pub const NUM_VISITS: &str = "num_visits";
    pub const REMARKS: &str = "remarks";
    pub const PHOTO: &str = "photo";

    /// Prefix of a product quantity field (`qty:<index>`).
    pub const QUANTITY_PREFIX: &str = "qty:";
    /// Prefix of a product stock-on-hand field (`stock:<index>`).
    pub const STOCK_PREFIX: &str = "stock:";

    /// Quantity field for the product at `index` in form order.
    ///
    /// Product fields are keyed by position because product names are free
    /// text and do not survive every multipart encoder unchanged.
    #[must_use]
    pub fn quantity(index: usize) -> String {
        format!("{QUANTITY_PREFIX}{index}")
    }

    /// Stock-on-hand field for the product at `index` in form order.
    #[must_use]
    pub fn stock(index: usize) -> String {
        format!("{STOCK_PREFIX}{index}")
    }
}

/// Date format used by `<input type="date">`.
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Stage
// =============================================================================

/// Where a caller is in the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStage {
    /// No session; only the login form is available.
    Unauthenticated,
    /// Administrator; sees the upload panel instead of the form.
    AuthenticatedAdmin,
    /// Employee with a form to fill in.
    EmployeeFilling,
    /// Employee who just submitted; sees the confirmation and a fresh form.
    EmployeeSubmitted,
    /// Logged in with a role that has no view.
    NoAccess,
}

impl FormStage {
    /// The stage a caller lands on before submitting anything.
    #[must_use]
    pub const fn entry(role: Option<&Role>) -> Self {
        match role {
            None => Self::Unauthenticated,
            Some(Role::Admin) => Self::AuthenticatedAdmin,
            Some(Role::Employee) => Self::EmployeeFilling,
            Some(Role::Other(_)) => Self::NoAccess,
        }
    }

    /// Path of the page that renders this stage.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Unauthenticated => "/auth/login",
            Self::AuthenticatedAdmin => "/admin",
            Self::EmployeeFilling | Self::EmployeeSubmitted | Self::NoAccess => "/orders/new",
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Choices offered to one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Employee identities the user may submit as.
    pub employee_names: Vec<String>,
    /// Distributors for the selected employee.
    pub distributors: ReferenceList,
    /// Products, in form order.
    pub products: ReferenceList,
}

impl FormOptions {
    /// Options for the logged-in `username`.
    ///
    /// The distributor list follows the first permitted employee identity,
    /// which is the one the form pre-selects.
    #[must_use]
    pub fn for_user(data: &ReferenceData, username: &str) -> Self {
        let employee_names = data.mapping.employee_names_for(username);
        let distributors = data
            .mapping
            .distributor_choices(employee_names.first().map(String::as_str), &data.distributors);
        Self {
            employee_names,
            distributors,
            products: data.products.clone(),
        }
    }

    /// Select-box options for the employee name, marking `selected`.
    #[must_use]
    pub fn employee_options(&self, selected: &str) -> Vec<SelectOption> {
        SelectOption::list(self.employee_names.iter().map(String::as_str), selected)
    }

    /// Select-box options for the distributor, marking `selected`.
    #[must_use]
    pub fn distributor_options(&self, selected: &str) -> Vec<SelectOption> {
        SelectOption::list(self.distributors.iter(), selected)
    }

    /// A fresh draft with the first choices pre-selected.
    #[must_use]
    pub fn fresh_draft(&self, today: NaiveDate) -> OrderDraft {
        let mut draft = OrderDraft::reset(&self.products, today);
        if let Some(name) = self.employee_names.first() {
            draft.employee_name.clone_from(name);
        }
        if let Some(distributor) = self.distributors.iter().next() {
            distributor.clone_into(&mut draft.distributor);
        }
        draft
    }
}

/// One `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    fn list<'a>(values: impl Iterator<Item = &'a str>, selected: &str) -> Vec<Self> {
        values
            .map(|value| Self {
                value: value.to_owned(),
                selected: value == selected,
            })
            .collect()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Text fields of one submitted form plus the uploaded photo.
#[derive(Debug, Clone, Default)]
pub struct SubmittedForm {
    values: HashMap<String, String>,
    photo: Option<UploadedPhoto>,
}

/// Photo part as received, before its type is checked.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SubmittedForm {
    /// Record a text field. A repeated name keeps the last value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Record the photo part. An empty part (no file chosen) is ignored.
    pub fn set_photo(&mut self, filename: impl Into<String>, bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        self.photo = Some(UploadedPhoto {
            filename: filename.into(),
            bytes,
        });
    }

    fn text(&self, name: &str) -> &str {
        self.values.get(name).map_or("", |v| v.trim())
    }

    /// Build the draft and check the photo type.
    ///
    /// Always returns a draft holding every value that parsed, so the form
    /// can be shown again with the user's input.
    #[must_use]
    pub fn parse(&self, products: &ReferenceList, today: NaiveDate) -> ParsedOrder {
        let mut draft = OrderDraft::reset(products, today);
        let mut error = None;
        let mut keep_first = |result: Result<(), SubmissionError>| {
            if let Err(e) = result
                && error.is_none()
            {
                error = Some(e);
            }
        };

        self.text(fields::EMPLOYEE_NAME).clone_into(&mut draft.employee_name);
        self.text(fields::DISTRIBUTOR).clone_into(&mut draft.distributor);
        self.text(fields::SHOP_NAME).clone_into(&mut draft.shop_name);
        self.text(fields::BEAT_AREA).clone_into(&mut draft.beat_area);
        self.text(fields::REMARKS).clone_into(&mut draft.remarks);

        keep_first(parse_margin(self.text(fields::MARGIN)).map(|m| draft.margin = m));
        keep_first(
            parse_date("order date", self.text(fields::ORDER_DATE), today)
                .map(|d| draft.order_date = d),
        );
        keep_first(
            parse_date("last visited date", self.text(fields::LAST_VISITED), today)
                .map(|d| draft.last_visited = d),
        );
        keep_first(parse_visits(self.text(fields::NUM_VISITS)).map(|v| draft.num_visits = v));

        for (index, line) in draft.lines.iter_mut().enumerate() {
            keep_first(
                parse_count(&line.product, "quantity", self.text(&fields::quantity(index)))
                    .map(|q| line.quantity = q),
            );
            keep_first(
                parse_count(&line.product, "stock", self.text(&fields::stock(index)))
                    .map(|s| line.stock_on_hand = s),
            );
        }

        let photo = match self.photo.as_ref().map(to_photo).transpose() {
            Ok(photo) => photo,
            Err(e) => {
                keep_first(Err(e));
                None
            }
        };

        ParsedOrder {
            draft,
            photo,
            photo_attached: self.photo.is_some(),
            field_error: error,
        }
    }
}

/// Result of [`SubmittedForm::parse`].
#[derive(Debug, Clone)]
pub struct ParsedOrder {
    /// Every value that parsed, with defaults for the rest.
    pub draft: OrderDraft,
    /// The photo, if one was attached with an accepted type.
    pub photo: Option<Photo>,
    /// Whether a non-empty photo part was received at all.
    pub photo_attached: bool,
    /// First field that failed to parse or was out of range.
    pub field_error: Option<SubmissionError>,
}

fn to_photo(upload: &UploadedPhoto) -> Result<Photo, SubmissionError> {
    let kind = PhotoKind::from_filename(&upload.filename)
        .ok_or_else(|| SubmissionError::invalid("photo", "upload a .jpg, .jpeg or .png image"))?;
    Ok(Photo {
        original_name: upload.filename.clone(),
        kind,
        bytes: upload.bytes.clone(),
    })
}

fn parse_margin(raw: &str) -> Result<Decimal, SubmissionError> {
    if raw.is_empty() {
        return Ok(OrderDraft::default_margin());
    }
    let margin = Decimal::from_str(raw)
        .map_err(|_| SubmissionError::invalid("margin", "must be a number"))?;
    if margin < Decimal::ZERO || margin > Decimal::from(OrderDraft::MAX_MARGIN) {
        return Err(SubmissionError::invalid("margin", "must be between 0 and 100"));
    }
    Ok(margin)
}

fn parse_date(field: &str, raw: &str, today: NaiveDate) -> Result<NaiveDate, SubmissionError> {
    if raw.is_empty() {
        return Ok(today);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| SubmissionError::invalid(field, "must be a date (YYYY-MM-DD)"))
}

fn parse_visits(raw: &str) -> Result<u32, SubmissionError> {
    if raw.is_empty() {
        return Ok(1);
    }
    match raw.parse::<u32>() {
        Ok(visits) if visits >= 1 => Ok(visits),
        _ => Err(SubmissionError::invalid(
            "number of visits",
            "must be a whole number of at least 1",
        )),
    }
}

fn parse_count(product: &str, what: &str, raw: &str) -> Result<u32, SubmissionError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>().map_err(|_| {
        SubmissionError::invalid(
            format!("{product} {what}"),
            "must be a whole number of 0 or more",
        )
    })
}

// =============================================================================
// Validation
// =============================================================================

/// Check a parsed form against the caller's options and the submission
/// rules.
///
/// Errors are reported in a fixed order: missing required fields first
/// (an employee name the user may not claim counts as missing), then
/// fields that failed to parse or were out of range, then the distributor
/// choice, then missing remarks. A blank or unknown distributor is
/// rejected whenever the employee has choices to offer.
///
/// # Errors
///
/// Returns the first `SubmissionError` found.
pub fn validate(
    parsed: ParsedOrder,
    options: &FormOptions,
) -> Result<OrderSubmission, SubmissionError> {
    let ParsedOrder {
        draft,
        photo,
        photo_attached,
        field_error,
    } = parsed;

    if !options.employee_names.contains(&draft.employee_name) {
        return Err(SubmissionError::MissingRequiredField("employee name"));
    }
    if draft.shop_name.is_empty() {
        return Err(SubmissionError::MissingRequiredField("shop name"));
    }
    if !photo_attached {
        return Err(SubmissionError::MissingRequiredField("photo"));
    }

    if let Some(e) = field_error {
        return Err(e);
    }

    if !options.distributors.is_empty() && !options.distributors.contains(&draft.distributor) {
        let reason = if draft.distributor.is_empty() {
            "choose a distributor"
        } else {
            "not available for this employee"
        };
        return Err(SubmissionError::invalid("distributor", reason));
    }

    draft.into_submission(photo)
}

/// Rows a submission will write, for the confirmation page.
#[must_use]
pub fn ordered_summary(submission: &OrderSubmission) -> Vec<ProductLine> {
    submission.ordered_lines().cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use field_orders_core::EmployeeMapping;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn data() -> ReferenceData {
        ReferenceData {
            products: ReferenceList::from_values(["Product A", "Product B"]),
            mapping: EmployeeMapping::from_pairs([("Asha", "D1"), ("Asha", "D2"), ("Ravi", "D3")]),
            ..ReferenceData::default()
        }
    }

    fn asha_form() -> SubmittedForm {
        let mut form = SubmittedForm::default();
        form.insert(fields::EMPLOYEE_NAME, "Asha");
        form.insert(fields::DISTRIBUTOR, "D1");
        form.insert(fields::SHOP_NAME, "Blue Mart");
        form.insert(fields::MARGIN, "20");
        form.insert(fields::NUM_VISITS, "1");
        form.insert(fields::quantity(0), "5");
        form.insert(fields::stock(0), "2");
        form.set_photo("shop.jpg", vec![0xFF, 0xD8]);
        form
    }

    #[test]
    fn test_entry_stage_by_role() {
        assert_eq!(FormStage::entry(None), FormStage::Unauthenticated);
        assert_eq!(FormStage::entry(Some(&Role::Admin)), FormStage::AuthenticatedAdmin);
        assert_eq!(FormStage::entry(Some(&Role::Employee)), FormStage::EmployeeFilling);
        assert_eq!(
            FormStage::entry(Some(&Role::Other("manager".into()))),
            FormStage::NoAccess
        );
        assert_eq!(FormStage::Unauthenticated.landing_path(), "/auth/login");
        assert_eq!(FormStage::AuthenticatedAdmin.landing_path(), "/admin");
    }

    #[test]
    fn test_options_scoped_to_username() {
        let options = FormOptions::for_user(&data(), "Asha");
        assert_eq!(options.employee_names, vec!["Asha".to_string()]);
        assert_eq!(options.distributors.as_slice(), ["D1", "D2"]);

        let draft = options.fresh_draft(today());
        assert_eq!(draft.employee_name, "Asha");
        assert_eq!(draft.distributor, "D1");
        assert_eq!(draft.lines.len(), 2);
    }

    #[test]
    fn test_unmapped_user_gets_full_distributor_list() {
        let options = FormOptions::for_user(&data(), "Meena");
        assert!(options.employee_names.is_empty());
        assert_eq!(options.distributors, ReferenceList::default_distributors());
    }

    #[test]
    fn test_select_options_mark_selection() {
        let options = FormOptions::for_user(&data(), "Asha");
        let rendered = options.distributor_options("D2");
        assert!(!rendered[0].selected);
        assert!(rendered[1].selected);
    }

    #[test]
    fn test_parse_and_validate_scenario() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let parsed = asha_form().parse(&data.products, today());
        assert!(parsed.field_error.is_none());
        assert_eq!(parsed.draft.lines[0].quantity, 5);
        assert_eq!(parsed.draft.lines[0].stock_on_hand, 2);
        assert_eq!(parsed.draft.lines[1].quantity, 0);

        let submission = validate(parsed, &options).unwrap();
        assert_eq!(ordered_summary(&submission).len(), 1);
        assert_eq!(submission.photo().kind, PhotoKind::Jpeg);
    }

    #[test]
    fn test_product_fields_keyed_by_position() {
        let products = ReferenceList::from_values([r#"5" Cake"#, "Tea; 250g"]);
        let mut form = SubmittedForm::default();
        form.insert(fields::quantity(0), "4");
        form.insert(fields::stock(1), "7");
        form.insert(r#"qty:5" Cake"#, "9");

        let parsed = form.parse(&products, today());
        assert!(parsed.field_error.is_none());
        assert_eq!(parsed.draft.lines[0].product, r#"5" Cake"#);
        assert_eq!(parsed.draft.lines[0].quantity, 4);
        assert_eq!(parsed.draft.lines[1].quantity, 0);
        assert_eq!(parsed.draft.lines[1].stock_on_hand, 7);
    }

    #[test]
    fn test_cannot_claim_other_employee() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.insert(fields::EMPLOYEE_NAME, "Ravi");

        assert_eq!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::MissingRequiredField("employee name"))
        );
    }

    #[test]
    fn test_distributor_outside_choices_rejected() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.insert(fields::DISTRIBUTOR, "D3");

        assert!(matches!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_blank_distributor_rejected_when_choices_exist() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.insert(fields::DISTRIBUTOR, "");

        assert_eq!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::invalid("distributor", "choose a distributor"))
        );
    }

    #[test]
    fn test_blank_distributor_allowed_without_choices() {
        let data = data();
        let mut options = FormOptions::for_user(&data, "Asha");
        options.distributors = ReferenceList::default();
        let mut form = asha_form();
        form.insert(fields::DISTRIBUTOR, "");

        let submission = validate(form.parse(&data.products, today()), &options).unwrap();
        assert_eq!(submission.draft().distributor, "");
    }

    #[test]
    fn test_range_errors_keep_other_input() {
        let data = data();
        let mut form = asha_form();
        form.insert(fields::MARGIN, "150");
        form.insert(fields::quantity(1), "-3");
        let parsed = form.parse(&data.products, today());

        assert_eq!(
            parsed.field_error,
            Some(SubmissionError::invalid("margin", "must be between 0 and 100"))
        );
        assert_eq!(parsed.draft.shop_name, "Blue Mart");
        assert_eq!(parsed.draft.margin, OrderDraft::default_margin());
        assert_eq!(parsed.draft.lines[0].quantity, 5);
    }

    #[test]
    fn test_missing_required_field_reported_before_range_error() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.insert(fields::SHOP_NAME, "  ");
        form.insert(fields::MARGIN, "150");

        assert_eq!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::MissingRequiredField("shop name"))
        );

        let mut form = asha_form();
        form.photo = None;
        form.insert(fields::NUM_VISITS, "0");
        assert_eq!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::MissingRequiredField("photo"))
        );
    }

    #[test]
    fn test_visits_must_be_positive() {
        assert!(parse_visits("0").is_err());
        assert!(parse_visits("two").is_err());
        assert_eq!(parse_visits("").unwrap(), 1);
        assert_eq!(parse_visits("3").unwrap(), 3);
    }

    #[test]
    fn test_margin_accepts_decimals() {
        assert_eq!(parse_margin("12.5").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_margin("0").unwrap(), Decimal::ZERO);
        assert!(parse_margin("100.1").is_err());
        assert!(parse_margin("abc").is_err());
    }

    #[test]
    fn test_dates_default_to_today() {
        assert_eq!(parse_date("order date", "", today()).unwrap(), today());
        assert_eq!(
            parse_date("order date", "2025-05-30", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 30).unwrap()
        );
        assert!(parse_date("order date", "30/05/2025", today()).is_err());
    }

    #[test]
    fn test_photo_type_and_presence() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.set_photo("notes.pdf", vec![1, 2, 3]);
        let parsed = form.parse(&data.products, today());
        assert!(parsed.photo.is_none());
        assert!(parsed.photo_attached);
        assert!(matches!(
            validate(parsed, &options),
            Err(SubmissionError::InvalidField { .. })
        ));

        let mut form = asha_form();
        form.photo = None;
        form.set_photo("", Vec::new());
        let parsed = form.parse(&data.products, today());
        assert!(parsed.field_error.is_none());
        assert_eq!(
            validate(parsed, &options),
            Err(SubmissionError::MissingRequiredField("photo"))
        );
    }

    #[test]
    fn test_all_zero_requires_remarks() {
        let data = data();
        let options = FormOptions::for_user(&data, "Asha");
        let mut form = asha_form();
        form.insert(fields::quantity(0), "0");
        form.insert(fields::stock(0), "0");
        assert_eq!(
            validate(form.parse(&data.products, today()), &options),
            Err(SubmissionError::MissingRemarks)
        );

        form.insert(fields::REMARKS, "store closed");
        let submission = validate(form.parse(&data.products, today()), &options).unwrap();
        assert!(ordered_summary(&submission).is_empty());
    }
}
