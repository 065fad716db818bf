//! Header-driven view of the country CSV.
//!
//! Columns are located by name, never by position. Rows shorter than the
//! header read as empty cells and are padded on write, so scripts that add a
//! column never lose data in older rows.

use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::error::StanceMapError;
use crate::types::CountryRecord;

pub const COL_COUNTRY: &str = "country";
pub const COL_CODE: &str = "code";
pub const COL_MINISTRY_URL: &str = "foreign_affairs_ministry_url";
/// Name of the URL column before the prober first rewrote it.
pub const COL_LEGACY_DOMAIN: &str = "foreign_affairs_ministry_domain";
pub const COL_HTTP_STATUS: &str = "http_response_code";
pub const COL_ROBOTS: &str = "robots_txt";
/// Boolean liveness column superseded by `http_response_code`.
pub const COL_LEGACY_WORKING: &str = "url_working";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CountryTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StanceMapError> {
        let mut csv = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers = csv.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv.records() {
            let row: Vec<String> = record?.iter().map(str::to_string).collect();
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn parse(text: &str) -> Result<Self, StanceMapError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn read(path: &Path) -> Result<Self, StanceMapError> {
        let file = std::fs::File::open(path).map_err(|e| StanceMapError::io(path, e))?;
        Self::from_reader(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), StanceMapError> {
        let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            let mut padded = row.clone();
            if padded.len() < self.headers.len() {
                padded.resize(self.headers.len(), String::new());
            }
            csv.write_record(&padded)?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, StanceMapError> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write via a sibling temp file and rename, so a crash mid-write never
    /// leaves a truncated CSV behind.
    pub fn write(&self, path: &Path) -> Result<(), StanceMapError> {
        let tmp = path.with_extension("csv.tmp");
        let file = std::fs::File::create(&tmp).map_err(|e| StanceMapError::io(&tmp, e))?;
        self.to_writer(file)?;
        std::fs::rename(&tmp, path).map_err(|e| StanceMapError::io(path, e))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, StanceMapError> {
        self.column(name)
            .ok_or_else(|| StanceMapError::MissingColumn(name.to_string()))
    }

    /// Index of `name`, appending the column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        match self.column(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        }
    }

    /// Returns whether a column was renamed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if self.column(to).is_some() {
            return false;
        }
        match self.column(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop a column and its cells. Returns whether it existed.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        true
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.into();
    }

    /// Cell by column name; empty when the column is missing.
    pub fn value(&self, row: usize, name: &str) -> &str {
        self.column(name).map(|c| self.get(row, c)).unwrap_or("")
    }

    pub fn record(&self, row: usize) -> CountryRecord {
        CountryRecord {
            name: self.value(row, COL_COUNTRY).trim().to_string(),
            code: self.value(row, COL_CODE).trim().to_string(),
            ministry_url: self.value(row, COL_MINISTRY_URL).trim().to_string(),
            http_status: self.value(row, COL_HTTP_STATUS).trim().to_string(),
            robots_status: self.value(row, COL_ROBOTS).trim().to_string(),
        }
    }

    pub fn records(&self) -> Vec<CountryRecord> {
        (0..self.rows.len()).map(|row| self.record(row)).collect()
    }
}
