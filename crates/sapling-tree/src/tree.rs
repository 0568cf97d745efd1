use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    TreeError,
    impurity::ClassCounts,
    node::{Node, SplitTest},
    select::select_split,
    split::ThresholdPolicy,
    table::{Dataset, Row, Schema},
};

/// Configuration for gain-ratio decision tree induction.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default            |
/// |--------------------|--------------------|
/// | `threshold_policy` | `Midpoint`         |
/// | `max_depth`        | `None` (unlimited) |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) threshold_policy: ThresholdPolicy,
    pub(crate) max_depth: Option<usize>,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            threshold_policy: ThresholdPolicy::Midpoint,
            max_depth: None,
        }
    }

    /// Set the rule for choosing numeric and temporal split points.
    #[must_use]
    pub fn with_threshold_policy(mut self, threshold_policy: ThresholdPolicy) -> Self {
        self.threshold_policy = threshold_policy;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// `None` grows until every subset is pure or uninformative. `Some(d)`
    /// turns nodes at depth `d` into majority leaves (the root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    // --- Getters ---

    /// Return the threshold policy.
    #[must_use]
    pub fn threshold_policy(&self) -> ThresholdPolicy {
        self.threshold_policy
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Induce a decision tree from `dataset`.
    ///
    /// # Errors
    ///
    /// | Variant                        | When                     |
    /// |--------------------------------|--------------------------|
    /// | [`TreeError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`TreeError::EmptyDataset`]    | `dataset` has zero rows  |
    #[instrument(skip(self, dataset), fields(n_rows = dataset.n_rows()))]
    pub fn fit(&self, dataset: &Dataset) -> Result<DecisionTree, TreeError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }
        if dataset.n_rows() == 0 {
            return Err(TreeError::EmptyDataset);
        }

        let schema = dataset.schema();
        debug!(
            n_rows = dataset.n_rows(),
            n_attributes = schema.attributes().len(),
            threshold_policy = ?self.threshold_policy,
            "fitting decision tree"
        );

        let rows = dataset.row_refs();
        let root = build_node(&rows, schema, self, 0);

        debug!(
            n_nodes = root.n_nodes(),
            n_leaves = root.n_leaves(),
            depth = root.depth(),
            "decision tree built"
        );

        Ok(DecisionTree {
            root,
            attributes: schema.attributes().to_vec(),
            label: schema.label_name().to_string(),
            threshold_policy: self.threshold_policy,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively grow the subtree for a non-empty row subset.
fn build_node(rows: &[&Row], schema: &Schema, config: &DecisionTreeConfig, depth: usize) -> Node {
    let counts = ClassCounts::from_rows(rows);
    let majority = counts.majority().unwrap_or_default().to_string();

    if counts.len() <= 1 {
        return Node::leaf(majority);
    }
    if config.max_depth.is_some_and(|max_d| depth >= max_d) {
        return Node::leaf(majority);
    }

    let Some(selected) = select_split(rows, schema, config.threshold_policy) else {
        return Node::leaf(majority);
    };
    if selected.score.gain_ratio <= 0.0 {
        return Node::leaf(majority);
    }
    let non_empty = selected
        .split
        .partition
        .values()
        .filter(|subset| !subset.is_empty())
        .count();
    if non_empty < 2 {
        return Node::leaf(majority);
    }

    let test = selected
        .split
        .threshold
        .map_or(SplitTest::Categorical, SplitTest::Threshold);
    let children: BTreeMap<String, Node> = selected
        .split
        .partition
        .into_iter()
        .map(|(key, subset)| {
            let child = if subset.is_empty() {
                Node::leaf(majority.clone())
            } else {
                build_node(&subset, schema, config, depth + 1)
            };
            (key, child)
        })
        .collect();

    Node::Internal {
        attribute: selected.score.name,
        test,
        children,
    }
}

/// A fitted gain-ratio decision tree.
///
/// Read-only after construction; persisted with [`DecisionTree::save`] and
/// restored with [`DecisionTree::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub(crate) root: Node,
    pub(crate) attributes: Vec<String>,
    pub(crate) label: String,
    pub(crate) threshold_policy: ThresholdPolicy,
}

impl DecisionTree {
    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Return the attribute names the tree was trained on, in header order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Return the name of the label column.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the threshold policy used during training.
    #[must_use]
    pub fn threshold_policy(&self) -> ThresholdPolicy {
        self.threshold_policy
    }

    /// Total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.root.n_nodes()
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Length of the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}
