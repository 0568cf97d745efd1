//! Domain types for sapling-io.

use sapling_tree::Record;

/// Raw string rows of a CSV file, as read for prediction.
///
/// Produced by [`RecordReader`](crate::RecordReader). Values are kept exactly
/// as they appear in the file so they can be echoed to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    /// Column names from the CSV header.
    header: Vec<String>,
    /// Cell values: `rows[row_index][column_index]`.
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Create a table. Callers guarantee every row matches the header length.
    pub(crate) fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == header.len()));
        Self { header, rows }
    }

    /// Return the column names.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Return the raw rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the position of `name` in the header, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Return every value of column `name`, or `None` if the column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[index].as_str()).collect())
    }

    /// Fraction of rows whose `label` column equals the matching prediction.
    ///
    /// Values are trimmed before comparing, as class labels are trimmed
    /// when a training table is built. Returns `None` when the column is
    /// absent, the table is empty, or `predictions` has a different length.
    #[must_use]
    pub fn accuracy(&self, label: &str, predictions: &[&str]) -> Option<f64> {
        let truth = self.column(label)?;
        if truth.is_empty() || truth.len() != predictions.len() {
            return None;
        }
        let correct = truth
            .iter()
            .zip(predictions)
            .filter(|(t, p)| t.trim() == p.trim())
            .count();
        Some(correct as f64 / truth.len() as f64)
    }

    /// Convert every row into a `name -> value` record for prediction.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| self.header.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}
