//! CSV readers for training tables and prediction records.

use std::path::{Path, PathBuf};

use sapling_tree::Dataset;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RecordTable;

/// Header and raw rows of a validated CSV file.
struct RawCsv {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Read a headed CSV file, checking that every row matches the header.
fn read_raw(path: &Path) -> Result<RawCsv, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    // flexible(true) allows rows with varying column counts so that our own
    // InconsistentRowLength check fires instead of a low-level CsvParse error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header: Vec<String> = rdr
        .headers()
        .map_err(|e| IoError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if header.is_empty() {
        return Err(IoError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }
    let expected_cols = header.len();
    debug!(expected_cols, "read CSV header");

    let mut rows = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| IoError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;

        if record.len() != expected_cols {
            return Err(IoError::InconsistentRowLength {
                path: path.to_path_buf(),
                row_index,
                expected: expected_cols,
                got: record.len(),
            });
        }
        rows.push(record.iter().map(String::from).collect());
    }

    if rows.is_empty() {
        return Err(IoError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    Ok(RawCsv { header, rows })
}

/// Reads a labeled training table from a CSV file.
///
/// Expected CSV format:
/// - Header row required; one column is the class label
/// - The label is the last column unless named with [`TableReader::with_label`]
/// - All rows must have the same number of columns
///
/// Column types are inferred from the values when the table is built.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyHeader`] | Header row has no columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::LabelColumnNotFound`] | Named label column is not in the header |
/// | [`IoError::Table`] | Typed table construction failed |
pub struct TableReader {
    path: PathBuf,
    label: Option<String>,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label: None,
        }
    }

    /// Use the column named `label` as the class label.
    ///
    /// The column is moved to the last position of the table.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Read and validate the CSV file, returning a typed [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let RawCsv {
            mut header,
            mut rows,
        } = read_raw(&self.path)?;

        if let Some(label) = &self.label {
            let index = header
                .iter()
                .position(|h| h == label)
                .ok_or_else(|| IoError::LabelColumnNotFound {
                    path: self.path.clone(),
                    label: label.clone(),
                })?;
            let name = header.remove(index);
            header.push(name);
            for row in &mut rows {
                let value = row.remove(index);
                row.push(value);
            }
        }

        let dataset = Dataset::from_records(header, rows).map_err(|e| IoError::Table {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_rows = dataset.n_rows(),
            n_attributes = dataset.schema().attributes().len(),
            label = dataset.schema().label_name(),
            "training table loaded"
        );

        Ok(dataset)
    }
}

/// Reads raw string records from a CSV file for prediction.
///
/// Values are not typed; the tree parses them at each threshold node.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyHeader`] | Header row has no columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
pub struct RecordReader {
    path: PathBuf,
}

impl RecordReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`RecordTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<RecordTable, IoError> {
        let RawCsv { header, rows } = read_raw(&self.path)?;
        info!(n_rows = rows.len(), n_columns = header.len(), "records loaded");
        Ok(RecordTable::new(header, rows))
    }
}
