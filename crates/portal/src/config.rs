//! Portal configuration loaded from environment variables.
//!
//! Every variable is optional; the defaults reproduce the fixed file names and
//! Google resource identifiers the portal has always used.
//!
//! # Environment Variables
//!
//! ## Server
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 8501)
//! - `PORTAL_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: <http://localhost:8501>)
//! - `MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 20 MiB)
//!
//! ## Reference files
//! - `DISTRIBUTOR_FILE` (default: distributors.csv)
//! - `PRODUCT_FILE` (default: products.csv)
//! - `USERS_FILE` (default: users.csv)
//! - `EMPLOYEE_MAPPING_FILE` (default: `employee_distributor_map.csv`)
//! - `IMAGE_DIR` - Local photo directory (default: images)
//!
//! ## Google
//! - `GOOGLE_SERVICE_ACCOUNT_FILE` - Service account key JSON
//!   (default: streamlit-sheets.json)
//! - `GOOGLE_SHEET_ID` - Ledger spreadsheet ID
//! - `GOOGLE_SHEET_RANGE` - Range rows are appended to (default: Sheet1)
//! - `DRIVE_FOLDER_ID` - Drive folder receiving photos
//!
//! ## Observability
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` (default: 1.0)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use field_orders_core::ReferenceSlot;
use thiserror::Error;
use url::Url;

const DEFAULT_SHEET_ID: &str = "1hbUt6Qzk_uMeYRX_1bV11JRwFyOpOXU8GutmzKe6TWU";
const DEFAULT_DRIVE_FOLDER_ID: &str = "1b96TC89lrujL-JG66PZGhteTuQXSRVM0";
const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";
const DEFAULT_DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Local reference spreadsheet paths
    pub files: ReferenceFiles,
    /// Directory photos are written to
    pub image_dir: PathBuf,
    /// Google Sheets / Drive configuration
    pub google: GoogleConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Paths of the four reference files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFiles {
    pub distributors: PathBuf,
    pub products: PathBuf,
    pub users: PathBuf,
    pub employee_mapping: PathBuf,
}

impl ReferenceFiles {
    /// All four files inside `dir`, using the default file names.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            distributors: dir.join("distributors.csv"),
            products: dir.join("products.csv"),
            users: dir.join("users.csv"),
            employee_mapping: dir.join("employee_distributor_map.csv"),
        }
    }

    /// The file backing `slot`.
    #[must_use]
    pub fn path(&self, slot: ReferenceSlot) -> &Path {
        match slot {
            ReferenceSlot::Distributors => &self.distributors,
            ReferenceSlot::Products => &self.products,
            ReferenceSlot::Users => &self.users,
            ReferenceSlot::EmployeeMapping => &self.employee_mapping,
        }
    }

    fn from_env() -> Self {
        Self {
            distributors: get_env_or_default("DISTRIBUTOR_FILE", "distributors.csv").into(),
            products: get_env_or_default("PRODUCT_FILE", "products.csv").into(),
            users: get_env_or_default("USERS_FILE", "users.csv").into(),
            employee_mapping: get_env_or_default(
                "EMPLOYEE_MAPPING_FILE",
                "employee_distributor_map.csv",
            )
            .into(),
        }
    }
}

impl Default for ReferenceFiles {
    fn default() -> Self {
        Self::in_dir(Path::new(""))
    }
}

/// Google API configuration.
///
/// The API base URLs (`GOOGLE_SHEETS_API`, `GOOGLE_DRIVE_UPLOAD_API`) are
/// configurable so the clients can be pointed at a local server.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Service account key file (read lazily on first API call)
    pub service_account_file: PathBuf,
    /// Ledger spreadsheet ID
    pub sheet_id: String,
    /// A1 range rows are appended after
    pub sheet_range: String,
    /// Drive folder receiving photos
    pub drive_folder_id: String,
    /// Sheets API base URL
    pub sheets_api: String,
    /// Drive upload API base URL
    pub drive_upload_api: String,
}

impl GoogleConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service_account_file: get_env_or_default(
                "GOOGLE_SERVICE_ACCOUNT_FILE",
                "streamlit-sheets.json",
            )
            .into(),
            sheet_id: get_env_or_default("GOOGLE_SHEET_ID", DEFAULT_SHEET_ID),
            sheet_range: get_env_or_default("GOOGLE_SHEET_RANGE", "Sheet1"),
            drive_folder_id: get_env_or_default("DRIVE_FOLDER_ID", DEFAULT_DRIVE_FOLDER_ID),
            sheets_api: parse_url_env("GOOGLE_SHEETS_API", DEFAULT_SHEETS_API)?,
            drive_upload_api: parse_url_env("GOOGLE_DRIVE_UPLOAD_API", DEFAULT_DRIVE_UPLOAD_API)?,
        })
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            service_account_file: PathBuf::from("streamlit-sheets.json"),
            sheet_id: DEFAULT_SHEET_ID.to_owned(),
            sheet_range: "Sheet1".to_owned(),
            drive_folder_id: DEFAULT_DRIVE_FOLDER_ID.to_owned(),
            sheets_api: DEFAULT_SHEETS_API.to_owned(),
            drive_upload_api: DEFAULT_DRIVE_UPLOAD_API.to_owned(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORTAL_PORT", "8501")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_PORT".to_string(), e.to_string()))?;
        let base_url = parse_url_env("PORTAL_BASE_URL", "http://localhost:8501")?;
        let max_upload_bytes = match get_optional_env("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidEnvVar("MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let files = ReferenceFiles::from_env();
        let image_dir = get_env_or_default("IMAGE_DIR", "images").into();
        let google = GoogleConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            max_upload_bytes,
            files,
            image_dir,
            google,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration rooted in `dir`: reference files and the image directory
    /// live inside it. Used by the CLI and tests.
    #[must_use]
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            files: ReferenceFiles::in_dir(dir),
            image_dir: dir.join("images"),
            ..Self::default()
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8501,
            base_url: "http://localhost:8501".to_owned(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            files: ReferenceFiles::default(),
            image_dir: PathBuf::from("images"),
            google: GoogleConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a URL-valued environment variable, rejecting values that do not parse.
fn parse_url_env(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}
