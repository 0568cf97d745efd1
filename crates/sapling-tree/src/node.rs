use std::collections::BTreeMap;
use std::fmt;

/// How an internal node routes a record to one of its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitTest {
    /// One child per literal value observed during training.
    Categorical,
    /// Two children keyed `<=T` and `>T`.
    Threshold(f64),
}

impl fmt::Display for SplitTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitTest::Categorical => f.write_str("categorical"),
            SplitTest::Threshold(t) => write!(f, "threshold {t:.2}"),
        }
    }
}

/// A node of a fitted decision tree.
///
/// Children are owned in a map ordered by branch key, so a tree is a plain
/// value graph with no shared nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A terminal node predicting a single class.
    Leaf {
        /// Predicted class label.
        class: String,
    },
    /// A decision node testing one attribute.
    Internal {
        /// Name of the attribute tested at this node.
        attribute: String,
        /// Categorical or threshold routing.
        test: SplitTest,
        /// Branch key → child.
        children: BTreeMap<String, Node>,
    },
}

impl Node {
    /// Create a leaf predicting `class`.
    #[must_use]
    pub fn leaf(class: impl Into<String>) -> Self {
        Node::Leaf {
            class: class.into(),
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Return the predicted class of a leaf, `None` for internal nodes.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Node::Leaf { class } => Some(class),
            Node::Internal { .. } => None,
        }
    }

    /// Return the tested attribute of an internal node.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Node::Internal { attribute, .. } => Some(attribute),
            Node::Leaf { .. } => None,
        }
    }

    /// Return the child reached by `key`, if any.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Internal { children, .. } => children.get(key),
            Node::Leaf { .. } => None,
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => {
                1 + children.values().map(Node::n_nodes).sum::<usize>()
            }
        }
    }

    /// Number of leaves in this subtree.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => children.values().map(Node::n_leaves).sum(),
        }
    }

    /// Length of the longest root-to-leaf path; a lone leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { children, .. } => {
                1 + children.values().map(Node::depth).max().unwrap_or(0)
            }
        }
    }

    /// Most frequent class among the leaves below this node.
    ///
    /// Ties go to the lexicographically smallest class name.
    #[must_use]
    pub fn majority_leaf_class(&self) -> Option<&str> {
        let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
        self.tally_leaves(&mut tally);
        let mut best: Option<(&str, usize)> = None;
        for (class, count) in tally {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
    }

    fn tally_leaves<'a>(&'a self, tally: &mut BTreeMap<&'a str, usize>) {
        match self {
            Node::Leaf { class } => *tally.entry(class.as_str()).or_insert(0) += 1,
            Node::Internal { children, .. } => {
                for child in children.values() {
                    child.tally_leaves(tally);
                }
            }
        }
    }
}
