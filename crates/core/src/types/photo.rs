//! Shop photos and their stored filenames.

use chrono::NaiveDateTime;

/// Timestamp format used in stored filenames and the ledger timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Image types accepted by the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Jpeg,
    Png,
}

impl PhotoKind {
    /// Detect the kind from an uploaded filename's extension.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// MIME type sent to the remote file store.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// An uploaded shop photo.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    /// Filename as sent by the browser.
    pub original_name: String,
    pub kind: PhotoKind,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("original_name", &self.original_name)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Format a timestamp with one-second resolution (`YYYYMMDD_HHMMSS`).
#[must_use]
pub fn timestamp_label(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Make a shop name safe to embed in a filename.
///
/// Spaces and any character other than ASCII letters, digits, `-` and `_`
/// become `_`. An empty result becomes `shop`.
#[must_use]
pub fn sanitize_shop_name(shop_name: &str) -> String {
    let cleaned: String = shop_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "shop".to_owned()
    } else {
        cleaned
    }
}

/// Stored photo filename: `<shop>_<YYYYMMDD_HHMMSS>.jpg`.
///
/// `attempt` disambiguates collisions within the same second: attempt 1 is
/// the plain name, attempt 2 appends `_2`, and so on.
#[must_use]
pub fn photo_filename(shop_name: &str, timestamp: &str, attempt: u32) -> String {
    let shop = sanitize_shop_name(shop_name);
    if attempt <= 1 {
        format!("{shop}_{timestamp}.jpg")
    } else {
        format!("{shop}_{timestamp}_{attempt}.jpg")
    }
}
