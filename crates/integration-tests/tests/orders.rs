//! Order submission end to end: validation, photo storage, upload, ledger.

use field_orders_core::{PhotoKind, ReferenceSlot};
use field_orders_integration_tests::{
    JPEG_BYTES, MemoryFileStore, OrderForm, TestPortal, login_with, new_client,
};
use reqwest::StatusCode;

async fn logged_in(portal: TestPortal) -> TestPortal {
    portal.login("Asha", "1234").await;
    portal
}

// ============================================================================
// Accepted orders
// ============================================================================

#[tokio::test]
async fn test_order_appends_one_row_per_ordered_product() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .line("Product A", 3, 5)
                .line("Product B", 0, 7)
                .line("Product C", 2, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("Order for Blue Mart saved (2 rows)."));

    let rows = portal.ledger.rows();
    let products: Vec<_> = rows
        .iter()
        .map(|row| row.product.as_ref().map(|p| (p.name.as_str(), p.quantity, p.stock_on_hand)))
        .collect();
    assert_eq!(
        products,
        vec![Some(("Product A", 3, 5)), Some(("Product C", 2, 0))]
    );

    let first = rows.first().expect("first row");
    assert_eq!(first.employee_name, "Asha");
    assert_eq!(first.distributor, "D1");
    assert_eq!(first.shop_name, "Blue Mart");
    assert_eq!(first.beat_area, "North");
    assert_eq!(first.order_date.to_string(), "2025-06-02");
    assert_eq!(first.last_visited.to_string(), "2025-05-30");
    assert_eq!(first.num_visits, 2);
    assert!(first.timestamp.len() == 15 && first.timestamp.contains('_'));
    assert!(rows.iter().all(|row| row.timestamp == first.timestamp));

    // Photo stored locally under the sanitized shop name, and uploaded
    let expected_name = format!("Blue_Mart_{}.jpg", first.timestamp);
    assert!(first.local_photo_path.ends_with(&expected_name));
    let saved = std::fs::read(portal.image_dir().join(&expected_name)).expect("read saved photo");
    assert_eq!(saved, JPEG_BYTES);

    let uploads = portal.files.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = uploads.first().expect("upload");
    assert_eq!(upload.filename, expected_name);
    assert_eq!(upload.kind, PhotoKind::Jpeg);
    assert_eq!(first.remote_photo_url, MemoryFileStore::link_for(&expected_name));

    // Confirmation lists the ordered lines and offers a fresh form
    assert!(body.contains("<td>Product C</td><td>2</td><td>0</td>"));
    assert!(body.contains("Next shop"));
    assert!(body.contains(r#"name="shop_name" value="""#));
}

#[tokio::test]
async fn test_nothing_ordered_with_remarks_appends_summary_row() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().set("remarks", "Shop closed"))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("saved (1 row)."));

    let rows = portal.ledger.rows();
    assert_eq!(rows.len(), 1);
    let row = rows.first().expect("summary row");
    assert!(row.product.is_none());
    assert_eq!(row.remarks, "Shop closed");
}

#[tokio::test]
async fn test_stock_only_order_needs_no_remarks() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product B", 0, 4))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let rows = portal.ledger.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows.first().expect("row").product.is_none());
}

#[tokio::test]
async fn test_png_photo_accepted() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .line("Product A", 1, 0)
                .photo("SHOP.PNG", b"\x89PNG\r\n"),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let uploads = portal.files.uploads();
    assert_eq!(uploads.first().expect("upload").kind, PhotoKind::Png);
}

#[tokio::test]
async fn test_upload_failure_still_records_order() {
    let portal = logged_in(TestPortal::builder().standard_reference().failing_uploads().start().await).await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product A", 1, 0))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("Error uploading to Drive"));
    assert!(body.contains("saved (1 row)."));

    let rows = portal.ledger.rows();
    assert_eq!(rows.len(), 1);
    let row = rows.first().expect("row");
    assert_eq!(row.remote_photo_url, "");
    assert!(!row.local_photo_path.is_empty());
}

#[tokio::test]
async fn test_ledger_failure_fails_submission() {
    let portal = logged_in(TestPortal::builder().standard_reference().failing_ledger().start().await).await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product A", 1, 0))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("could not be recorded in the sheet"));
    assert!(!body.contains("backend unavailable"));
    // Input is kept for a retry
    assert!(body.contains(r#"value="Blue Mart""#));

    // The photo was stored before the append failed
    let saved = std::fs::read_dir(portal.image_dir())
        .expect("read image dir")
        .count();
    assert_eq!(saved, 1);
}

#[tokio::test]
async fn test_same_second_photos_do_not_overwrite() {
    let portal = logged_in(TestPortal::start().await).await;
    let order = || OrderForm::asha_at_blue_mart().line("Product A", 1, 0);

    portal.submit_order(order()).await;
    portal.submit_order(order()).await;

    let mut names: Vec<String> = portal
        .files
        .uploads()
        .into_iter()
        .map(|upload| upload.filename)
        .collect();
    names.dedup();
    assert_eq!(names.len(), 2, "every submission gets its own photo file");
}

// ============================================================================
// Rejected orders
// ============================================================================

#[tokio::test]
async fn test_missing_photo_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product A", 3, 0).without_photo())
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("photo is missing"));
    assert!(body.contains(r#"value="Blue Mart""#));
    assert!(body.contains(r#"name="qty:0" min="0" step="1" value="3""#));
    assert!(portal.ledger.rows().is_empty());
    assert!(portal.files.uploads().is_empty());
}

#[tokio::test]
async fn test_blank_shop_name_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("shop_name", "   ")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("shop name is missing"));
    assert!(portal.ledger.rows().is_empty());
}

#[tokio::test]
async fn test_all_zero_without_remarks_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal.submit_order(OrderForm::asha_at_blue_mart()).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("remarks must be filled"));
    assert!(portal.ledger.rows().is_empty());
}

#[tokio::test]
async fn test_unsupported_photo_type_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .line("Product A", 1, 0)
                .photo("shop.gif", b"GIF89a"),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(portal.ledger.rows().is_empty());
}

#[tokio::test]
async fn test_margin_out_of_range_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("margin", "150")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("Invalid value for margin"));
}

#[tokio::test]
async fn test_cannot_submit_as_another_employee() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("employee_name", "Ravi")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(portal.ledger.rows().is_empty());
}

#[tokio::test]
async fn test_distributor_outside_choices_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("distributor", "D3")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("Invalid value for distributor"));
    assert!(portal.ledger.rows().is_empty());
}

#[tokio::test]
async fn test_blank_distributor_rejected() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("distributor", "")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("Invalid value for distributor"));
    assert!(portal.ledger.rows().is_empty());
    assert!(portal.files.uploads().is_empty());
}

#[tokio::test]
async fn test_missing_shop_name_reported_before_bad_margin() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("shop_name", "")
                .set("margin", "150")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("read body");
    assert!(body.contains("shop name is missing"));
    assert!(!body.contains("Invalid value for margin"));
}

#[tokio::test]
async fn test_product_names_with_markup_characters_are_ordered() {
    let portal = TestPortal::builder()
        .standard_reference()
        .reference(
            ReferenceSlot::Products,
            "Product\n\"5\"\" Cake\"\nTea & Biscuits\n",
        )
        .start()
        .await;
    portal.login("Asha", "1234").await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .line_at(0, 2, 1)
                .line_at(1, 4, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let ordered: Vec<_> = portal
        .ledger
        .rows()
        .into_iter()
        .filter_map(|row| row.product.map(|p| (p.name, p.quantity)))
        .collect();
    assert_eq!(
        ordered,
        vec![
            (r#"5" Cake"#.to_string(), 2),
            ("Tea & Biscuits".to_string(), 4),
        ]
    );
}

#[tokio::test]
async fn test_admin_cannot_submit_orders() {
    let portal = TestPortal::start().await;
    portal.login("admin", "admin").await;

    let resp = portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product A", 1, 0))
        .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(portal.ledger.rows().is_empty());
}

// ============================================================================
// Form scoping
// ============================================================================

#[tokio::test]
async fn test_mapped_distributors_only() {
    let portal = TestPortal::start().await;

    let resp = portal.login("Asha", "1234").await;

    let body = resp.text().await.expect("read body");
    assert!(body.contains(r#"<option value="D1" selected>"#));
    assert!(body.contains(r#"<option value="D2">"#));
    assert!(!body.contains(r#"<option value="D3""#));
}

#[tokio::test]
async fn test_unmapped_distributor_falls_back_to_full_list() {
    let portal = TestPortal::start().await;

    let resp = portal.login("Ravi", "pass").await;

    let body = resp.text().await.expect("read body");
    assert!(body.contains(r#"<option value="Ravi" selected>"#));
    assert!(body.contains(r#"<option value="D3">"#));

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("employee_name", "Ravi")
                .set("distributor", "D3")
                .line("Product A", 1, 0),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(portal.ledger.rows().first().expect("row").distributor, "D3");
}

#[tokio::test]
async fn test_unmapped_employee_has_no_identity_to_submit() {
    let portal = TestPortal::builder()
        .standard_reference()
        .reference(
            field_orders_core::ReferenceSlot::EmployeeMapping,
            "Employee,Distributor\nAsha,D1\n",
        )
        .start()
        .await;
    portal.login("Ravi", "pass").await;

    let resp = portal
        .submit_order(
            OrderForm::asha_at_blue_mart()
                .set("employee_name", "Ravi")
                .line("Product A", 1, 0),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(portal.ledger.rows().is_empty());
}

// ============================================================================
// Photo preview
// ============================================================================

#[tokio::test]
async fn test_saved_photo_is_served_to_logged_in_users() {
    let portal = logged_in(TestPortal::start().await).await;
    portal
        .submit_order(OrderForm::asha_at_blue_mart().line("Product A", 1, 0))
        .await;
    let filename = portal
        .files
        .uploads()
        .first()
        .expect("upload")
        .filename
        .clone();

    let resp = portal.get(&format!("/photos/{filename}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/jpeg")
    );
    assert_eq!(resp.bytes().await.expect("read body").as_ref(), JPEG_BYTES);

    // Anonymous clients are sent to the login page
    let anonymous = new_client();
    let resp = anonymous
        .get(portal.url(&format!("/photos/{filename}")))
        .send()
        .await
        .expect("GET request");
    assert_eq!(resp.url().path(), "/auth/login");

    // Another logged-in user can see it too
    let other = new_client();
    login_with(&other, &portal.base_url, "admin", "admin").await;
    let resp = other
        .get(portal.url(&format!("/photos/{filename}")))
        .send()
        .await
        .expect("GET request");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_photo_path_traversal_not_found() {
    let portal = logged_in(TestPortal::start().await).await;

    let resp = portal.get("/photos/..%2Fusers.csv.jpg").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
