use std::collections::BTreeMap;

use crate::error::TreeError;
use crate::impurity::entropy_of_counts;
use crate::table::{Row, Schema};

/// Rule for choosing the split point of a numeric or temporal attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Midpoint between adjacent distinct values with the lowest weighted
    /// entropy.
    #[default]
    Midpoint,
    /// The sorted value at position `len / 2`, regardless of its entropy.
    Median,
}

/// Branch key → rows routed to that branch, ordered by key.
pub type Partition<'a> = BTreeMap<String, Vec<&'a Row>>;

/// A binary threshold split of a row subset.
#[derive(Debug, Clone)]
pub struct ThresholdSplit<'a> {
    /// Rows with `value <= threshold` go left.
    pub threshold: f64,
    /// Rows whose comparable value is `<= threshold`.
    pub left: Vec<&'a Row>,
    /// Every other row, including rows without a comparable value.
    pub right: Vec<&'a Row>,
}

/// Branch key for values at or below `threshold`.
#[must_use]
pub fn le_key(threshold: f64) -> String {
    format!("<={threshold:.2}")
}

/// Branch key for values above `threshold`.
#[must_use]
pub fn gt_key(threshold: f64) -> String {
    format!(">{threshold:.2}")
}

/// Group rows by the literal value at `attr_index`.
///
/// Every row lands in exactly one subset; missing cells group under `""`.
#[must_use]
pub fn split_categorical<'a>(rows: &[&'a Row], attr_index: usize) -> Partition<'a> {
    let mut subsets = Partition::new();
    for &row in rows {
        subsets
            .entry(row.cell(attr_index).category())
            .or_default()
            .push(row);
    }
    subsets
}

/// Find the binary threshold for a numeric or temporal attribute.
///
/// Returns `None` when no row has a comparable value at `attr_index`.
///
/// With [`ThresholdPolicy::Midpoint`], sorts the `(value, class)` pairs and
/// scans left-to-right with incremental class counts, scoring the midpoint
/// between each pair of adjacent distinct values by weighted entropy. The
/// first minimum in sorted order wins. A column with a single distinct
/// value yields that value as the threshold.
#[must_use]
pub fn best_threshold<'a>(
    rows: &[&'a Row],
    attr_index: usize,
    policy: ThresholdPolicy,
) -> Option<ThresholdSplit<'a>> {
    // Dense class ids for the counting scan.
    let mut classes: Vec<&str> = Vec::new();
    let class_ids: Vec<usize> = rows
        .iter()
        .map(|row| match classes.iter().position(|&c| c == row.label()) {
            Some(id) => id,
            None => {
                classes.push(row.label());
                classes.len() - 1
            }
        })
        .collect();

    let mut sorted: Vec<(f64, usize)> = rows
        .iter()
        .zip(&class_ids)
        .filter_map(|(row, &id)| row.cell(attr_index).comparable().map(|v| (v, id)))
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let threshold = match policy {
        ThresholdPolicy::Median => sorted[sorted.len() / 2].0,
        ThresholdPolicy::Midpoint => {
            midpoint_scan(&sorted, &class_ids, classes.len()).unwrap_or(sorted[0].0)
        }
    };

    let (left, right): (Vec<&Row>, Vec<&Row>) = rows
        .iter()
        .partition(|row| row.cell(attr_index).comparable().is_some_and(|v| v <= threshold));

    Some(ThresholdSplit {
        threshold,
        left,
        right,
    })
}

/// Return the entropy-minimizing midpoint, or `None` with one distinct value.
///
/// Rows without a comparable value stay in the right-hand counts for every
/// candidate, matching how they are routed after the split.
fn midpoint_scan(sorted: &[(f64, usize)], class_ids: &[usize], n_classes: usize) -> Option<f64> {
    let n_samples = class_ids.len();
    let n = n_samples as f64;

    let mut left_counts = vec![0usize; n_classes];
    let mut right_counts = vec![0usize; n_classes];
    for &id in class_ids {
        right_counts[id] += 1;
    }

    let mut best: Option<(f64, f64)> = None;
    for i in 0..sorted.len() - 1 {
        let (val_i, class_i) = sorted[i];
        left_counts[class_i] += 1;
        right_counts[class_i] -= 1;

        let val_next = sorted[i + 1].0;
        if val_i == val_next {
            continue;
        }

        let n_left = i + 1;
        let n_right = n_samples - n_left;
        let weighted = (n_left as f64 * entropy_of_counts(&left_counts, n_left)
            + n_right as f64 * entropy_of_counts(&right_counts, n_right))
            / n;

        if best.is_none_or(|(w, _)| weighted < w) {
            best = Some((weighted, (val_i + val_next) / 2.0));
        }
    }
    best.map(|(_, threshold)| threshold)
}

/// A partition of a subset on one column, with the threshold used if any.
#[derive(Debug, Clone)]
pub(crate) struct ColumnSplit<'a> {
    pub(crate) threshold: Option<f64>,
    pub(crate) partition: Partition<'a>,
}

/// Partition `rows` on the column at `attr_index` according to its type.
///
/// Ordered columns without any comparable value fall back to the sentinel
/// threshold `0.0`, sending every row to the `>` branch.
pub(crate) fn split_column<'a>(
    rows: &[&'a Row],
    schema: &Schema,
    attr_index: usize,
    policy: ThresholdPolicy,
) -> ColumnSplit<'a> {
    if !schema.column_type(attr_index).is_ordered() {
        return ColumnSplit {
            threshold: None,
            partition: split_categorical(rows, attr_index),
        };
    }

    let ThresholdSplit {
        threshold,
        left,
        right,
    } = best_threshold(rows, attr_index, policy).unwrap_or_else(|| ThresholdSplit {
        threshold: 0.0,
        left: Vec::new(),
        right: rows.to_vec(),
    });

    let mut partition = Partition::new();
    partition.insert(le_key(threshold), left);
    partition.insert(gt_key(threshold), right);
    ColumnSplit {
        threshold: Some(threshold),
        partition,
    }
}

/// Partition `rows` on the attribute named `attribute`.
///
/// Categorical attributes split by literal value; numeric and temporal
/// attributes split into `<=T` / `>T` on their best threshold.
///
/// # Errors
///
/// Returns [`TreeError::AttributeNotFound`] when `attribute` is not in the
/// schema's header.
pub fn split<'a>(
    rows: &[&'a Row],
    schema: &Schema,
    attribute: &str,
    policy: ThresholdPolicy,
) -> Result<Partition<'a>, TreeError> {
    let attr_index = schema.index_of(attribute)?;
    Ok(split_column(rows, schema, attr_index, policy).partition)
}
