//! Prediction by tree traversal.

use std::collections::HashMap;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::node::{Node, SplitTest};
use crate::split::{gt_key, le_key};
use crate::temporal::parse_comparable;
use crate::tree::DecisionTree;

/// Class returned when a record lacks an attribute the tree tests.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// A record to classify: attribute name → raw string value.
pub type Record = HashMap<String, String>;

/// Branch key for a raw value at a threshold node.
///
/// Values that parse as neither number nor date take the `>` branch, the
/// same side missing values take during training.
fn threshold_key(raw: &str, threshold: f64) -> String {
    match parse_comparable(raw) {
        Some(v) if v <= threshold => le_key(threshold),
        _ => gt_key(threshold),
    }
}

impl DecisionTree {
    /// Predict the class of a single record.
    ///
    /// Returns [`UNKNOWN_CLASS`] when the record is missing an attribute on
    /// its path. When the record's value has no matching branch, returns the
    /// most frequent class among the leaves below the current node.
    #[must_use]
    pub fn predict(&self, record: &Record) -> &str {
        let mut node = &self.root;
        loop {
            let (attribute, test, children) = match node {
                Node::Leaf { class } => return class,
                Node::Internal {
                    attribute,
                    test,
                    children,
                } => (attribute, test, children),
            };
            let Some(raw) = record.get(attribute) else {
                return UNKNOWN_CLASS;
            };
            let key = match test {
                SplitTest::Categorical => raw.trim().to_string(),
                SplitTest::Threshold(t) => threshold_key(raw, *t),
            };
            match children.get(&key) {
                Some(child) => node = child,
                None => return node.majority_leaf_class().unwrap_or(UNKNOWN_CLASS),
            }
        }
    }

    /// Predict classes for a batch of records in parallel.
    ///
    /// Output order matches input order.
    #[must_use]
    pub fn predict_batch(&self, records: &[Record]) -> Vec<&str> {
        records
            .par_iter()
            .map(|record| self.predict(record))
            .collect()
    }
}
