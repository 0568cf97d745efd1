//! CSV writer for prediction output.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RecordTable;

/// Name of the column appended to the input table.
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Writes input records with one predicted class per row.
///
/// The output repeats the input header and values unchanged and appends a
/// [`PREDICTION_COLUMN`] column. The parent directory is created on
/// construction if it does not exist.
pub struct PredictionWriter {
    path: PathBuf,
}

impl PredictionWriter {
    /// Create a new writer targeting the given CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the parent directory cannot be
    /// created.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn new(path: &Path) -> Result<Self, IoError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| IoError::OutputDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
            debug!("output directory ready");
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Return the output file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every row of `table` followed by its prediction.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::PredictionCountMismatch`] | `predictions` and `table` differ in length |
    /// | [`IoError::CsvWrite`] | File cannot be created or a record cannot be written |
    /// | [`IoError::WriteFile`] | Buffered output cannot be flushed |
    #[instrument(skip_all, fields(path = %self.path.display(), n_rows = table.n_rows()))]
    pub fn write(&self, table: &RecordTable, predictions: &[&str]) -> Result<(), IoError> {
        if predictions.len() != table.n_rows() {
            return Err(IoError::PredictionCountMismatch {
                expected: table.n_rows(),
                got: predictions.len(),
            });
        }

        let csv_err = |e: csv::Error| IoError::CsvWrite {
            path: self.path.clone(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(&self.path).map_err(csv_err)?;

        let header = table
            .header()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(PREDICTION_COLUMN));
        wtr.write_record(header).map_err(csv_err)?;

        for (row, &prediction) in table.rows().iter().zip(predictions) {
            let record = row
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(prediction));
            wtr.write_record(record).map_err(csv_err)?;
        }

        wtr.flush().map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        info!(n_predictions = predictions.len(), "predictions written");
        Ok(())
    }
}
