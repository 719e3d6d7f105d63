//! Header-plus-rows tables read from CSV or XLSX.
//!
//! Every cell is kept as text. Reference files are small, so tables are read
//! fully into memory.

use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use thiserror::Error;

/// Errors reading or writing a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// CSV could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX workbook could not be opened or read.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// The workbook has no worksheet.
    #[error("workbook contains no worksheet")]
    NoWorksheet,

    /// The file has no header row.
    #[error("file has no header row")]
    NoHeader,

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A header row plus data rows, all cells as text.
///
/// Rows are padded or truncated to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from headers and rows.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a CSV file from disk.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Io` if the file cannot be opened and
    /// `TableError::Csv` if it is not valid CSV.
    pub fn read_csv_path(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parse CSV from any reader. A UTF-8 byte order mark is ignored.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Csv` on malformed input and
    /// `TableError::NoHeader` for empty input.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(TableError::NoHeader);
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_owned).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Read the first worksheet of an XLSX workbook.
    ///
    /// Cells are rendered as text; numbers with no fractional part lose their
    /// trailing `.0`. Blank rows are dropped.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Xlsx` if the workbook is unreadable,
    /// `TableError::NoWorksheet` if it has no sheets and
    /// `TableError::NoHeader` if the first sheet is empty.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(TableError::NoWorksheet)??;

        let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers: Vec<String> = rows
            .next()
            .ok_or(TableError::NoHeader)?
            .into_iter()
            .map(|h| h.trim().to_owned())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(TableError::NoHeader);
        }

        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Ok(Self::new(headers, rows))
    }

    /// Write the table as CSV, replacing any existing file.
    ///
    /// The rows go to a temporary file in the same directory which is then
    /// renamed over `path`, so readers see either the old file or the new
    /// one in full.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Csv` or `TableError::Io` if the file cannot be
    /// written. `path` is unchanged on error.
    pub fn write_csv_path(&self, path: &Path) -> Result<(), TableError> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(temp.as_file_mut());
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the column named `name` (exact match after trimming).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Names from `required` that are not present in the header.
    #[must_use]
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.column_index(name).is_none())
            .collect()
    }

    /// Every value of column `name`, or `None` if the column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }
}

/// Render one spreadsheet cell as text.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract().abs() < f64::EPSILON && f.abs() < 1e15 => format!("{f:.0}"),
        other => other.to_string(),
    }
}
