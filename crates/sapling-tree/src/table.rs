//! Typed tabular dataset: per-column semantic types and tagged cell values.

use std::fmt;

use tracing::{debug, instrument};

use crate::error::TreeError;
use crate::temporal::{parse_number, parse_timestamp};

/// Semantic type of a column, inferred once per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    /// Compared by exact string equality.
    Categorical,
    /// Finite floating-point values.
    Numeric,
    /// Dates, compared as seconds since the Unix epoch.
    Temporal,
}

impl ColumnType {
    /// Return `true` for columns split on a binary threshold.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Temporal)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Categorical => "categorical",
            ColumnType::Numeric => "numeric",
            ColumnType::Temporal => "temporal",
        };
        f.write_str(name)
    }
}

/// A single cell, tagged consistently with its column's [`ColumnType`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Literal string value.
    Categorical(String),
    /// Parsed number.
    Numeric(f64),
    /// Seconds since the Unix epoch.
    Temporal(i64),
    /// Empty cell.
    Missing,
}

impl CellValue {
    /// Convert a raw (trimmed) string to a cell of the given column type.
    ///
    /// Empty strings become [`CellValue::Missing`]. A value that does not
    /// parse under its column type also becomes `Missing`; inference
    /// guarantees this never happens for values seen during detection.
    #[must_use]
    pub fn parse(raw: &str, column_type: ColumnType) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return CellValue::Missing;
        }
        match column_type {
            ColumnType::Categorical => CellValue::Categorical(raw.to_string()),
            ColumnType::Numeric => parse_number(raw).map_or(CellValue::Missing, CellValue::Numeric),
            ColumnType::Temporal => {
                parse_timestamp(raw).map_or(CellValue::Missing, CellValue::Temporal)
            }
        }
    }

    /// Value used for threshold comparisons, if the cell has one.
    #[must_use]
    pub fn comparable(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(v) => Some(*v),
            CellValue::Temporal(ts) => Some(*ts as f64),
            CellValue::Categorical(_) | CellValue::Missing => None,
        }
    }

    /// Key used for categorical grouping. Missing cells group under `""`.
    #[must_use]
    pub fn category(&self) -> String {
        match self {
            CellValue::Categorical(s) => s.clone(),
            CellValue::Numeric(v) => v.to_string(),
            CellValue::Temporal(ts) => ts.to_string(),
            CellValue::Missing => String::new(),
        }
    }
}

static MISSING: CellValue = CellValue::Missing;

/// One record: attribute cells terminated by the label cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    /// Create a row from attribute cells and a label.
    ///
    /// The label is appended as a categorical cell.
    #[must_use]
    pub fn new(mut cells: Vec<CellValue>, label: impl Into<String>) -> Self {
        cells.push(CellValue::Categorical(label.into()));
        Self { cells }
    }

    /// Return the cell at `index`, or [`CellValue::Missing`] when out of range.
    #[must_use]
    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&MISSING)
    }

    /// Return the class label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.cells.last() {
            Some(CellValue::Categorical(label)) => label,
            _ => "",
        }
    }

    /// Number of cells including the label.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Return `true` when the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Column names and types, index-aligned. The last column is the label.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    header: Vec<String>,
    column_types: Vec<ColumnType>,
}

impl Schema {
    /// Create a schema. The label column is forced to categorical.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyHeader`] when `header` is empty, and
    /// [`TreeError::RowLengthMismatch`] (row index 0) when the type vector
    /// is not aligned with the header.
    pub fn new(header: Vec<String>, mut column_types: Vec<ColumnType>) -> Result<Self, TreeError> {
        if header.is_empty() {
            return Err(TreeError::EmptyHeader);
        }
        if column_types.len() != header.len() {
            return Err(TreeError::RowLengthMismatch {
                row_index: 0,
                expected: header.len(),
                got: column_types.len(),
            });
        }
        if let Some(last) = column_types.last_mut() {
            *last = ColumnType::Categorical;
        }
        Ok(Self {
            header,
            column_types,
        })
    }

    /// Return the full header, label last.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Return the column types, aligned with [`Schema::header`].
    #[must_use]
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    /// Return the attribute names (every column except the label).
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.header[..self.header.len() - 1]
    }

    /// Return the label column name.
    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.header[self.header.len() - 1]
    }

    /// Return the position of `attribute` in the header.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::AttributeNotFound`] when the name is absent.
    pub fn index_of(&self, attribute: &str) -> Result<usize, TreeError> {
        self.header
            .iter()
            .position(|h| h == attribute)
            .ok_or_else(|| TreeError::AttributeNotFound {
                attribute: attribute.to_string(),
            })
    }

    /// Return the column type at `index`.
    #[must_use]
    pub fn column_type(&self, index: usize) -> ColumnType {
        self.column_types[index]
    }
}

/// Infer one [`ColumnType`] per column from raw string records.
///
/// Blank cells are ignored. A column is numeric when every non-empty value
/// is a finite number, temporal when every non-empty value is a date, and
/// categorical otherwise (including columns that are entirely blank).
#[must_use]
pub fn infer_column_types(n_columns: usize, records: &[Vec<String>]) -> Vec<ColumnType> {
    (0..n_columns)
        .map(|col| {
            let values: Vec<&str> = records
                .iter()
                .filter_map(|r| r.get(col))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                ColumnType::Categorical
            } else if values.iter().all(|v| parse_number(v).is_some()) {
                ColumnType::Numeric
            } else if values.iter().all(|v| parse_timestamp(v).is_some()) {
                ColumnType::Temporal
            } else {
                ColumnType::Categorical
            }
        })
        .collect()
}

/// An immutable typed training table.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from a header and raw string records.
    ///
    /// Column types are inferred across all records, then every cell is
    /// converted once. The last column is the label.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                   |
    /// |----------------------------------|----------------------------------------|
    /// | [`TreeError::EmptyHeader`]       | `header` is empty                      |
    /// | [`TreeError::EmptyDataset`]      | `records` is empty                     |
    /// | [`TreeError::RowLengthMismatch`] | a record's length differs from header  |
    #[instrument(skip_all, fields(n_columns = header.len(), n_rows = records.len()))]
    pub fn from_records(header: Vec<String>, records: Vec<Vec<String>>) -> Result<Self, TreeError> {
        if header.is_empty() {
            return Err(TreeError::EmptyHeader);
        }
        if records.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let n_columns = header.len();
        for (row_index, record) in records.iter().enumerate() {
            if record.len() != n_columns {
                return Err(TreeError::RowLengthMismatch {
                    row_index,
                    expected: n_columns,
                    got: record.len(),
                });
            }
        }

        let column_types = infer_column_types(n_columns, &records);
        let schema = Schema::new(header, column_types)?;

        let rows = records
            .into_iter()
            .map(|mut record| {
                let label = record.pop().unwrap_or_default().trim().to_string();
                let cells = record
                    .iter()
                    .enumerate()
                    .map(|(col, raw)| CellValue::parse(raw, schema.column_type(col)))
                    .collect();
                Row::new(cells, label)
            })
            .collect::<Vec<_>>();

        debug!(column_types = ?schema.column_types(), "column types inferred");

        Ok(Self { schema, rows })
    }

    /// Build a dataset from an explicit schema and pre-typed rows.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyDataset`] for zero rows and
    /// [`TreeError::RowLengthMismatch`] when a row is not aligned with the
    /// header.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self, TreeError> {
        if rows.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let expected = schema.header().len();
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(TreeError::RowLengthMismatch {
                    row_index,
                    expected,
                    got: row.len(),
                });
            }
        }
        Ok(Self { schema, rows })
    }

    /// Return the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return all rows in load order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Borrow every row, the starting subset for induction.
    #[must_use]
    pub fn row_refs(&self) -> Vec<&Row> {
        self.rows.iter().collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}
