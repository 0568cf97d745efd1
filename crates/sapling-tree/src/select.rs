//! Attribute scoring by information gain and gain ratio.

use crate::error::TreeError;
use crate::impurity::entropy;
use crate::split::{ColumnSplit, Partition, ThresholdPolicy, split_column};
use crate::table::{Row, Schema};

/// Score of one candidate attribute on a row subset.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeScore {
    /// Attribute name from the header.
    pub name: String,
    /// Column position in the header.
    pub index: usize,
    /// Entropy reduction achieved by the attribute's partition.
    pub information_gain: f64,
    /// Information gain normalized by split information.
    pub gain_ratio: f64,
}

/// The winning attribute together with the partition it produced.
#[derive(Debug, Clone)]
pub(crate) struct SelectedSplit<'a> {
    pub(crate) score: AttributeScore,
    pub(crate) split: ColumnSplit<'a>,
}

/// Entropy of the partition-size distribution.
///
/// Empty subsets contribute nothing. Returns 0.0 when `n_rows` is zero.
#[must_use]
pub fn split_information(partition: &Partition<'_>, n_rows: usize) -> f64 {
    if n_rows == 0 {
        return 0.0;
    }
    let n = n_rows as f64;
    -partition
        .values()
        .filter(|subset| !subset.is_empty())
        .map(|subset| {
            let p = subset.len() as f64 / n;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Gains at or below this are rounding noise from the entropy sums.
const GAIN_EPSILON: f64 = 1e-12;

fn partition_gain(rows: &[&Row], partition: &Partition<'_>) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let n = rows.len() as f64;
    let weighted: f64 = partition
        .values()
        .map(|subset| subset.len() as f64 / n * entropy(subset))
        .sum();
    let gain = entropy(rows) - weighted;
    if gain <= GAIN_EPSILON { 0.0 } else { gain }
}

/// Gain ratio of an already computed partition.
///
/// Zero when the gain is not positive, when split information is zero, or
/// when the partition has more than two subsets of one row each (an
/// identifier-like attribute).
fn partition_gain_ratio(partition: &Partition<'_>, n_rows: usize, gain: f64) -> f64 {
    if gain <= 0.0 {
        return 0.0;
    }
    if partition.len() > 2 && partition.values().all(|subset| subset.len() <= 1) {
        return 0.0;
    }
    let split_info = split_information(partition, n_rows);
    if split_info == 0.0 {
        return 0.0;
    }
    gain / split_info
}

/// Entropy reduction from partitioning `rows` on `attribute`.
///
/// Never negative. Returns 0.0 for an empty `rows` and for partitions whose
/// subsets all share the parent's label mix.
///
/// # Errors
///
/// Returns [`TreeError::AttributeNotFound`] when `attribute` is not in the
/// header.
pub fn information_gain(
    rows: &[&Row],
    schema: &Schema,
    attribute: &str,
    policy: ThresholdPolicy,
) -> Result<f64, TreeError> {
    let attr_index = schema.index_of(attribute)?;
    if rows.is_empty() {
        return Ok(0.0);
    }
    let split = split_column(rows, schema, attr_index, policy);
    Ok(partition_gain(rows, &split.partition))
}

/// Information gain of `attribute` divided by its split information.
///
/// Returns 0.0 when the information gain is 0.0 or the split information is
/// zero. It is also 0.0 when the attribute splits `rows` into more than two
/// subsets of at most one row each. That rule keeps identifier columns out
/// of the tree, but it equally zeroes a genuine categorical attribute on a
/// small subset, e.g. three rows with three distinct values.
///
/// # Errors
///
/// Returns [`TreeError::AttributeNotFound`] when `attribute` is not in the
/// header.
pub fn gain_ratio(
    rows: &[&Row],
    schema: &Schema,
    attribute: &str,
    policy: ThresholdPolicy,
) -> Result<f64, TreeError> {
    let attr_index = schema.index_of(attribute)?;
    Ok(score_column(rows, schema, attr_index, policy).score.gain_ratio)
}

fn score_column<'a>(
    rows: &[&'a Row],
    schema: &Schema,
    attr_index: usize,
    policy: ThresholdPolicy,
) -> SelectedSplit<'a> {
    let name = schema.header()[attr_index].clone();
    if rows.is_empty() {
        return SelectedSplit {
            score: AttributeScore {
                name,
                index: attr_index,
                information_gain: 0.0,
                gain_ratio: 0.0,
            },
            split: ColumnSplit {
                threshold: None,
                partition: Partition::new(),
            },
        };
    }
    let split = split_column(rows, schema, attr_index, policy);
    let information_gain = partition_gain(rows, &split.partition);
    let gain_ratio = partition_gain_ratio(&split.partition, rows.len(), information_gain);
    SelectedSplit {
        score: AttributeScore {
            name,
            index: attr_index,
            information_gain,
            gain_ratio,
        },
        split,
    }
}

/// Score every attribute in header order and keep the best gain ratio.
///
/// The running best starts at `-1.0`, so a zero-ratio attribute is still
/// returned when nothing scores higher; ties keep the earliest attribute.
pub(crate) fn select_split<'a>(
    rows: &[&'a Row],
    schema: &Schema,
    policy: ThresholdPolicy,
) -> Option<SelectedSplit<'a>> {
    let mut best: Option<SelectedSplit<'a>> = None;
    let mut best_ratio = -1.0;
    for attr_index in 0..schema.attributes().len() {
        let candidate = score_column(rows, schema, attr_index, policy);
        if candidate.score.gain_ratio > best_ratio {
            best_ratio = candidate.score.gain_ratio;
            best = Some(candidate);
        }
    }
    best
}

/// Pick the attribute with the highest gain ratio.
///
/// Returns `None` when the schema has no attribute besides the label.
#[must_use]
pub fn best_attribute(
    rows: &[&Row],
    schema: &Schema,
    policy: ThresholdPolicy,
) -> Option<AttributeScore> {
    select_split(rows, schema, policy).map(|selected| selected.score)
}
