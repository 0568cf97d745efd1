use std::path::PathBuf;

/// Errors from table construction, tree induction and model persistence.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when a named attribute does not exist in the header.
    #[error("attribute \"{attribute}\" not found in header")]
    AttributeNotFound {
        /// The attribute name that was looked up.
        attribute: String,
    },

    /// Returned when a table is built from a header with zero columns.
    #[error("header has zero columns")]
    EmptyHeader,

    /// Returned when a table is built from zero data rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when a row has a different number of cells than the header.
    #[error("row {row_index} has {got} cells, expected {expected}")]
    RowLengthMismatch {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Number of columns in the header.
        expected: usize,
        /// Number of cells in the row.
        got: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when a deserialized node record has an impossible shape.
    #[error("malformed model node: {reason}")]
    MalformedModel {
        /// Human-readable description of what is wrong with the node.
        reason: String,
    },

    /// Returned when saving a tree deeper than the model format allows.
    #[error("tree depth {depth} exceeds the model file limit of {max_depth}")]
    ModelTooDeep {
        /// Depth of the tree being saved.
        depth: usize,
        /// Deepest tree a model file may hold.
        max_depth: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
