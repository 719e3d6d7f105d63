//! End-to-end tests for the field order portal.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p field-orders-integration-tests
//! ```
//!
//! Each test starts the real router on an ephemeral port with its reference
//! files and image directory in a temporary directory. The Google Sheets and
//! Drive clients are replaced by the in-memory backends below, so no network
//! access or credentials are needed.
//!
//! # Test Categories
//!
//! - `auth` - Login, logout and role gating
//! - `admin` - Reference uploads and reloads
//! - `orders` - Order submission and persistence

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use field_orders_core::{LedgerRow, PhotoKind, ReferenceSlot};
use field_orders_portal::build_app;
use field_orders_portal::config::PortalConfig;
use field_orders_portal::services::orders::fields;
use field_orders_portal::services::{FileStore, FileStoreError, LedgerBackend, LedgerError};
use field_orders_portal::state::AppState;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// A tiny JPEG header, enough for the portal to store and serve.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Users file shared by most tests.
pub const USERS_CSV: &str = "Username,Password,Role\n\
                             Asha,1234,employee\n\
                             Ravi,pass,employee\n\
                             guest,guest,viewer\n";

/// Mapping: Asha serves D1 and D2, Ravi is mapped with no distributor.
pub const MAPPING_CSV: &str = "Employee,Distributor\nAsha,D1\nAsha,D2\nRavi,\n";

pub const DISTRIBUTORS_CSV: &str = "Distributor\nD1\nD2\nD3\n";

pub const PRODUCTS_CSV: &str = "Product\nProduct A\nProduct B\nProduct C\n";

/// Products of [`PRODUCTS_CSV`], in form order.
pub const PRODUCTS: [&str; 3] = ["Product A", "Product B", "Product C"];

// =============================================================================
// In-memory backends
// =============================================================================

/// Ledger that keeps appended rows in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<LedgerRow>>,
    fail: bool,
}

impl MemoryLedger {
    /// A ledger that rejects every append.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            rows: Mutex::default(),
            fail: true,
        }
    }

    /// Rows appended so far.
    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerBackend for MemoryLedger {
    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        if self.fail {
            return Err(LedgerError::Rejected {
                status: 503,
                body: "backend unavailable".into(),
            });
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }
}

/// An upload received by [`MemoryFileStore`].
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub filename: String,
    pub kind: PhotoKind,
    pub bytes: Vec<u8>,
}

/// File store that keeps uploads in memory and returns fake links.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    uploads: Mutex<Vec<StoredUpload>>,
    fail: bool,
}

impl MemoryFileStore {
    /// A store that rejects every upload.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            uploads: Mutex::default(),
            fail: true,
        }
    }

    /// Uploads received so far.
    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Link returned for an uploaded file.
    #[must_use]
    pub fn link_for(filename: &str) -> String {
        format!("https://drive.test/view/{filename}")
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(
        &self,
        filename: &str,
        kind: PhotoKind,
        bytes: &[u8],
    ) -> Result<String, FileStoreError> {
        if self.fail {
            return Err(FileStoreError::Other("quota exceeded".into()));
        }
        self.uploads.lock().unwrap().push(StoredUpload {
            filename: filename.to_owned(),
            kind,
            bytes: bytes.to_vec(),
        });
        Ok(Self::link_for(filename))
    }
}

// =============================================================================
// Test portal
// =============================================================================

/// Builder for a [`TestPortal`].
#[derive(Debug)]
pub struct PortalBuilder {
    dir: TempDir,
    ledger: MemoryLedger,
    files: MemoryFileStore,
}

impl PortalBuilder {
    /// Write a reference file before the portal starts.
    #[must_use]
    pub fn reference(self, slot: ReferenceSlot, contents: &str) -> Self {
        let config = PortalConfig::rooted_at(self.dir.path());
        std::fs::write(config.files.path(slot), contents).expect("write reference file");
        self
    }

    /// Write the standard users, mapping, distributor and product files.
    #[must_use]
    pub fn standard_reference(self) -> Self {
        self.reference(ReferenceSlot::Users, USERS_CSV)
            .reference(ReferenceSlot::EmployeeMapping, MAPPING_CSV)
            .reference(ReferenceSlot::Distributors, DISTRIBUTORS_CSV)
            .reference(ReferenceSlot::Products, PRODUCTS_CSV)
    }

    /// Make every photo upload fail.
    #[must_use]
    pub fn failing_uploads(mut self) -> Self {
        self.files = MemoryFileStore::failing();
        self
    }

    /// Make every ledger append fail.
    #[must_use]
    pub fn failing_ledger(mut self) -> Self {
        self.ledger = MemoryLedger::failing();
        self
    }

    /// Build the state and serve the router on an ephemeral port.
    pub async fn start(self) -> TestPortal {
        let config = PortalConfig::rooted_at(self.dir.path());
        let ledger = Arc::new(self.ledger);
        let files = Arc::new(self.files);

        let state = AppState::with_backends(
            config.clone(),
            Arc::clone(&ledger) as Arc<dyn LedgerBackend>,
            Arc::clone(&files) as Arc<dyn FileStore>,
        )
        .expect("create app state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = build_app(state);
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        TestPortal {
            base_url: format!("http://{addr}"),
            client: new_client(),
            config,
            ledger,
            files,
            server,
            _dir: self.dir,
        }
    }
}

/// A running portal plus a cookie-keeping client.
pub struct TestPortal {
    pub base_url: String,
    pub client: Client,
    pub config: PortalConfig,
    pub ledger: Arc<MemoryLedger>,
    pub files: Arc<MemoryFileStore>,
    server: JoinHandle<()>,
    _dir: TempDir,
}

impl Drop for TestPortal {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A client that keeps session cookies between requests.
#[must_use]
pub fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

impl TestPortal {
    /// Start configuring a portal with no reference files.
    #[must_use]
    pub fn builder() -> PortalBuilder {
        PortalBuilder {
            dir: TempDir::new().expect("create temp dir"),
            ledger: MemoryLedger::default(),
            files: MemoryFileStore::default(),
        }
    }

    /// A portal with the standard reference files and working backends.
    pub async fn start() -> Self {
        Self::builder().standard_reference().start().await
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Path of a slot's reference file.
    #[must_use]
    pub fn reference_path(&self, slot: ReferenceSlot) -> &Path {
        self.config.files.path(slot)
    }

    /// Directory photos are saved to.
    #[must_use]
    pub fn image_dir(&self) -> PathBuf {
        self.config.image_dir.clone()
    }

    /// GET `path` with the portal's client.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// Log in with the portal's client.
    pub async fn login(&self, username: &str, password: &str) -> Response {
        login_with(&self.client, &self.base_url, username, password).await
    }

    /// Upload a reference file through the admin panel.
    pub async fn upload_reference(&self, slot: &str, filename: &str, bytes: &[u8]) -> Response {
        let part = Part::bytes(bytes.to_vec()).file_name(filename.to_owned());
        self.client
            .post(self.url(&format!("/admin/upload/{slot}")))
            .multipart(Form::new().percent_encode_noop().part("file", part))
            .send()
            .await
            .expect("upload request")
    }

    /// Submit an order form.
    pub async fn submit_order(&self, order: OrderForm) -> Response {
        self.client
            .post(self.url("/orders"))
            .multipart(order.into_multipart())
            .send()
            .await
            .expect("order request")
    }
}

/// Log in `client` against the portal at `base_url`.
pub async fn login_with(client: &Client, base_url: &str, username: &str, password: &str) -> Response {
    client
        .post(format!("{base_url}/auth/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("login request")
}

// =============================================================================
// Order form
// =============================================================================

/// Fields of an order submission, with a photo attached by default.
#[derive(Debug, Clone)]
pub struct OrderForm {
    fields: Vec<(String, String)>,
    photo: Option<(String, Vec<u8>)>,
}

impl OrderForm {
    /// Asha ordering at Blue Mart through D1, with nothing counted yet.
    #[must_use]
    pub fn asha_at_blue_mart() -> Self {
        Self {
            fields: vec![
                ("employee_name".into(), "Asha".into()),
                ("distributor".into(), "D1".into()),
                ("shop_name".into(), "Blue Mart".into()),
                ("margin".into(), "20".into()),
                ("beat_area".into(), "North".into()),
                ("order_date".into(), "2025-06-02".into()),
                ("last_visited".into(), "2025-05-30".into()),
                ("num_visits".into(), "2".into()),
                ("remarks".into(), String::new()),
            ],
            photo: Some(("shop.jpg".into(), JPEG_BYTES.to_vec())),
        }
    }

    /// Set a field, replacing any earlier value.
    #[must_use]
    pub fn set(mut self, name: &str, value: &str) -> Self {
        self.fields.retain(|(n, _)| n != name);
        self.fields.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Quantity and stock on hand for `product`, one of [`PRODUCTS`].
    #[must_use]
    pub fn line(self, product: &str, quantity: u32, stock: u32) -> Self {
        let index = PRODUCTS
            .iter()
            .position(|p| *p == product)
            .unwrap_or_else(|| panic!("{product} is not a standard product"));
        self.line_at(index, quantity, stock)
    }

    /// Quantity and stock on hand for the product at `index` in form order.
    #[must_use]
    pub fn line_at(self, index: usize, quantity: u32, stock: u32) -> Self {
        self.set(&fields::quantity(index), &quantity.to_string())
            .set(&fields::stock(index), &stock.to_string())
    }

    /// Drop the photo.
    #[must_use]
    pub fn without_photo(mut self) -> Self {
        self.photo = None;
        self
    }

    /// Replace the photo.
    #[must_use]
    pub fn photo(mut self, filename: &str, bytes: &[u8]) -> Self {
        self.photo = Some((filename.to_owned(), bytes.to_vec()));
        self
    }

    fn into_multipart(self) -> Form {
        let form = self
            .fields
            .into_iter()
            .fold(Form::new().percent_encode_noop(), |form, (name, value)| {
                form.text(name, value)
            });
        match self.photo {
            Some((filename, bytes)) => form.part("photo", Part::bytes(bytes).file_name(filename)),
            None => form,
        }
    }
}
