//! CSV loading and prediction output for sapling.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::RecordTable;
pub use error::IoError;
pub use reader::{RecordReader, TableReader};
pub use writer::{PREDICTION_COLUMN, PredictionWriter};
