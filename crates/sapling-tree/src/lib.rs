//! Decision tree induction by gain ratio.
//!
//! Builds a multi-way classification tree from a typed table of categorical,
//! numeric and date columns. Categorical attributes branch on every observed
//! value; numeric and date attributes branch on a binary threshold. Fitted
//! trees predict single records or parallel batches and persist as JSON.

mod error;
mod impurity;
mod node;
mod predict;
mod select;
mod serialize;
mod split;
mod table;
mod temporal;
mod tree;

pub use error::TreeError;
pub use impurity::{ClassCounts, class_counts, entropy, majority_label};
pub use node::{Node, SplitTest};
pub use predict::{Record, UNKNOWN_CLASS};
pub use select::{AttributeScore, best_attribute, gain_ratio, information_gain, split_information};
pub use serialize::MAX_MODEL_DEPTH;
pub use split::{
    Partition, ThresholdPolicy, ThresholdSplit, best_threshold, gt_key, le_key, split,
    split_categorical,
};
pub use table::{CellValue, ColumnType, Dataset, Row, Schema, infer_column_types};
pub use temporal::{DATE_FORMATS, parse_comparable, parse_date, parse_number, parse_timestamp};
pub use tree::{DecisionTree, DecisionTreeConfig};
