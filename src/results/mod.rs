//! Result table persistence
//!
//! `;`-delimited table, one row per (product, nutrient):
//!
//! ```text
//! code;nutriment;ground_truth;predicted
//! 3228857000852;energy;262;262
//! 3228857000852;protein;8.2;-1
//! ```
//!
//! Absent values are written as `-1`. A product's rows are written and
//! flushed together. An interrupted run can still leave a line cut short at
//! the end; reading skips it and appending truncates it before resuming.

use crate::models::{present, Nutrient, NutrientValue, ResultRow};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::warn;

pub const HEADER: [&str; 4] = ["code", "nutriment", "ground_truth", "predicted"];

/// Wire marker for an absent value
pub const ABSENT: &str = "-1";

const DELIMITER: u8 = b';';

/// Appends product rows to a result table
pub struct ResultWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl ResultWriter<File> {
    /// Truncate `path` and write the header
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create result file {}", path.display()))?;
        Self::from_writer(file, true)
    }

    /// Open `path` for appending; the header is written only if the file is new or empty.
    ///
    /// A trailing line without a newline (left by an interrupted run) is cut
    /// off first so new rows start on a line of their own.
    pub fn append(path: &Path) -> Result<Self> {
        let kept = drop_partial_line(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open result file {}", path.display()))?;
        Self::from_writer(file, kept == 0)
    }
}

/// Truncate `path` after its last newline; returns the remaining length
fn drop_partial_line(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read result file {}", path.display()))?;
    let kept = content
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);
    if kept < content.len() {
        warn!(
            "Dropping incomplete last line of {}: {:?}",
            path.display(),
            String::from_utf8_lossy(&content[kept..])
        );
        OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_len(kept as u64))
            .with_context(|| format!("Failed to truncate result file {}", path.display()))?;
    }
    Ok(kept as u64)
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(writer: W, write_header: bool) -> Result<Self> {
        let mut inner = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(writer);
        if write_header {
            inner.write_record(HEADER)?;
            inner.flush()?;
        }
        Ok(Self { inner })
    }

    /// Write every row of one product, then flush
    pub fn write_product(&mut self, rows: &[ResultRow]) -> Result<()> {
        for row in rows {
            let ground_truth = format_value(row.ground_truth);
            let predicted = format_value(row.predicted);
            self.inner.write_record([
                row.code.as_str(),
                row.nutrient.name(),
                ground_truth.as_str(),
                predicted.as_str(),
            ])?;
        }
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush result table: {}", e.error()))
    }
}

pub fn format_value(value: NutrientValue) -> String {
    match present(value) {
        Some(v) => v.to_string(),
        None => ABSENT.to_string(),
    }
}

/// Parse a table cell; `-1`, empty and non-numeric cells are absent
pub fn parse_value(cell: &str) -> NutrientValue {
    present(cell.trim().parse::<f64>().ok())
}

#[derive(Debug, Deserialize)]
struct RawRow {
    code: String,
    nutriment: String,
    ground_truth: String,
    predicted: String,
}

/// Read every row of a result table
pub fn read_rows(path: &Path) -> Result<Vec<ResultRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open result file {}", path.display()))?;
    read_rows_from(file).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read result rows from any reader. Rows with the wrong number of fields
/// (a line cut short by an interrupted run) or naming an unknown nutrient are
/// skipped with a warning.
pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Invalid row {}", idx + 1))?;
        if record.len() != HEADER.len() {
            warn!(
                "Skipping row {}: expected {} fields, found {}",
                idx + 1,
                HEADER.len(),
                record.len()
            );
            continue;
        }
        let raw: RawRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Invalid row {}", idx + 1))?;
        let nutrient: Nutrient = match raw.nutriment.parse() {
            Ok(n) => n,
            Err(e) => {
                warn!("Skipping row {}: {}", idx + 1, e);
                continue;
            }
        };
        rows.push(ResultRow {
            code: raw.code,
            nutrient,
            ground_truth: parse_value(&raw.ground_truth),
            predicted: parse_value(&raw.predicted),
        });
    }
    Ok(rows)
}

/// Product codes already present in a result table (for resume).
///
/// A missing file means nothing has been done yet.
pub fn completed_codes(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    Ok(read_rows(path)?.into_iter().map(|row| row.code).collect())
}
