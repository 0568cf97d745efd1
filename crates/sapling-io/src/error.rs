//! I/O error types for sapling-io.

use std::path::PathBuf;

use sapling_tree::TreeError;

/// Errors from file I/O, CSV parsing, and prediction output.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV header row has no columns.
    #[error("empty header in {path}")]
    EmptyHeader {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when the requested label column is not in the header.
    #[error("label column \"{label}\" not found in {path}")]
    LabelColumnNotFound {
        /// Path to the CSV file.
        path: PathBuf,
        /// The label column name that was requested.
        label: String,
    },

    /// Returned when the typed table cannot be built from the parsed records.
    #[error("invalid table in {path}")]
    Table {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying table error.
        source: TreeError,
    },

    /// Returned when the number of predictions differs from the number of rows.
    #[error("got {got} predictions for {expected} rows")]
    PredictionCountMismatch {
        /// Number of input rows.
        expected: usize,
        /// Number of predictions supplied.
        got: usize,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Directory that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an output CSV record cannot be written.
    #[error("cannot write CSV to {path}")]
    CsvWrite {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when an output file cannot be flushed to disk.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
