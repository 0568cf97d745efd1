//! Model persistence as pretty-printed JSON.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::node::{Node, SplitTest};
use crate::split::{ThresholdPolicy, gt_key, le_key};
use crate::tree::DecisionTree;

/// Current model file format version.
const FORMAT_VERSION: u32 = 1;

/// Deepest tree a model file may hold. Loading and dropping a model recurse
/// once per level, so this bounds stack use.
pub const MAX_MODEL_DEPTH: usize = 128;

/// JSON nesting of a tree of [`MAX_MODEL_DEPTH`]: the envelope, then a node
/// object and its `Children` map per level.
const MAX_JSON_NESTING: usize = 2 * MAX_MODEL_DEPTH + 2;

/// Deepest `{`/`[` nesting in `bytes`, ignoring brackets inside strings.
///
/// Stops counting once `limit` is exceeded.
fn json_nesting(bytes: &[u8], limit: usize) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &b in bytes {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
                if deepest > limit {
                    break;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Name of the label column.
    label: String,
    /// Attribute names in training header order.
    attributes: Vec<String>,
    /// Threshold policy used during training.
    threshold_policy: ThresholdPolicy,
    /// The serialized tree.
    tree: NodeRecord,
}

/// Flat on-disk shape shared by leaves and internal nodes.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, NodeRecord>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    class: String,
    is_leaf: bool,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        match node {
            Node::Leaf { class } => NodeRecord {
                attribute: String::new(),
                threshold: None,
                children: BTreeMap::new(),
                class: class.clone(),
                is_leaf: true,
            },
            Node::Internal {
                attribute,
                test,
                children,
            } => NodeRecord {
                attribute: attribute.clone(),
                threshold: match test {
                    SplitTest::Categorical => None,
                    SplitTest::Threshold(t) => Some(*t),
                },
                children: children
                    .iter()
                    .map(|(key, child)| (key.clone(), NodeRecord::from(child)))
                    .collect(),
                class: String::new(),
                is_leaf: false,
            },
        }
    }
}

fn malformed(reason: impl Into<String>) -> TreeError {
    TreeError::MalformedModel {
        reason: reason.into(),
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = TreeError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        if record.is_leaf {
            if !record.children.is_empty() {
                return Err(malformed(format!(
                    "leaf \"{}\" has {} children",
                    record.class,
                    record.children.len()
                )));
            }
            return Ok(Node::leaf(record.class));
        }

        if record.attribute.is_empty() {
            return Err(malformed("internal node without an attribute"));
        }
        if record.children.is_empty() {
            return Err(malformed(format!(
                "internal node on \"{}\" has no children",
                record.attribute
            )));
        }

        let test = match record.threshold {
            None => SplitTest::Categorical,
            Some(t) => {
                if !t.is_finite() {
                    return Err(malformed(format!(
                        "non-finite threshold on \"{}\"",
                        record.attribute
                    )));
                }
                let (le, gt) = (le_key(t), gt_key(t));
                if record.children.len() != 2
                    || !record.children.contains_key(&le)
                    || !record.children.contains_key(&gt)
                {
                    return Err(malformed(format!(
                        "threshold node on \"{}\" must have exactly the branches {le} and {gt}",
                        record.attribute
                    )));
                }
                SplitTest::Threshold(t)
            }
        };

        let children = record
            .children
            .into_iter()
            .map(|(key, child)| Node::try_from(child).map(|node| (key, node)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Node::Internal {
            attribute: record.attribute,
            test,
            children,
        })
    }
}

impl DecisionTree {
    /// Save the model as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ModelTooDeep`] | tree is deeper than [`MAX_MODEL_DEPTH`] |
    /// | [`TreeError::SerializeModel`] | JSON encoding failed |
    /// | [`TreeError::WriteModel`] | file write failed |
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();

        let depth = self.depth();
        if depth > MAX_MODEL_DEPTH {
            return Err(TreeError::ModelTooDeep {
                depth,
                max_depth: MAX_MODEL_DEPTH,
            });
        }

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            label: self.label.clone(),
            attributes: self.attributes.clone(),
            threshold_policy: self.threshold_policy,
            tree: NodeRecord::from(&self.root),
        };

        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| TreeError::SerializeModel { source: e })?;

        std::fs::write(path, &json).map_err(|e| TreeError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = json.len(),
            n_nodes = self.n_nodes(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a JSON file.
    ///
    /// Checks the format version and the shape of every node.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadModel`] | file read failed |
    /// | [`TreeError::DeserializeModel`] | JSON decoding failed |
    /// | [`TreeError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`TreeError::MalformedModel`] | a node has an impossible shape, or the tree is deeper than [`MAX_MODEL_DEPTH`] |
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| TreeError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Checked before deserializing, which recurses once per nesting level.
        let nesting = json_nesting(&bytes, MAX_JSON_NESTING);
        if nesting > MAX_JSON_NESTING {
            return Err(malformed(format!(
                "JSON nesting exceeds {MAX_JSON_NESTING} levels (tree deeper than {MAX_MODEL_DEPTH})"
            )));
        }

        // serde_json's own limit of 128 is below MAX_JSON_NESTING.
        let mut de = serde_json::Deserializer::from_slice(&bytes);
        de.disable_recursion_limit();
        let envelope: ModelEnvelope = serde::Deserialize::deserialize(&mut de)
            .and_then(|envelope| de.end().map(|()| envelope))
            .map_err(|e| TreeError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(TreeError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let root = Node::try_from(envelope.tree)?;

        debug!(
            n_nodes = root.n_nodes(),
            n_attributes = envelope.attributes.len(),
            label = %envelope.label,
            "model loaded"
        );

        Ok(DecisionTree {
            root,
            attributes: envelope.attributes,
            label: envelope.label,
            threshold_policy: envelope.threshold_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::predict::Record;
    use crate::table::Dataset;
    use crate::tree::DecisionTreeConfig;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn train_simple_model() -> DecisionTree {
        let ds = Dataset::from_records(
            strings(&["outlook", "temp", "play"]),
            vec![
                strings(&["Sunny", "30", "No"]),
                strings(&["Sunny", "18", "Yes"]),
                strings(&["Sunny", "32", "No"]),
                strings(&["Overcast", "25", "Yes"]),
                strings(&["Overcast", "19", "Yes"]),
                strings(&["Rain", "21", "Yes"]),
                strings(&["Rain", "15", "Yes"]),
                strings(&["Rain", "28", "No"]),
            ],
        )
        .unwrap();
        DecisionTreeConfig::new().fit(&ds).unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.json");

        let tree = train_simple_model();
        tree.save(&model_path).unwrap();
        let loaded = DecisionTree::load(&model_path).unwrap();

        assert_eq!(loaded, tree);
        let samples = vec![
            record(&[("outlook", "Sunny"), ("temp", "17")]),
            record(&[("outlook", "Rain"), ("temp", "40")]),
            record(&[("outlook", "Overcast"), ("temp", "40")]),
            record(&[("outlook", "Foggy"), ("temp", "20")]),
            record(&[("temp", "20")]),
        ];
        for sample in &samples {
            assert_eq!(tree.predict(sample), loaded.predict(sample), "sample {sample:?}");
        }
    }

    #[test]
    fn file_uses_pascal_case_node_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        train_simple_model().save(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["format_version"], 1);
        assert_eq!(json["label"], "play");
        assert_eq!(json["threshold_policy"], "midpoint");
        let root = &json["tree"];
        assert_eq!(root["IsLeaf"], false);
        assert!(root["Attribute"].is_string());
        assert!(root["Children"].is_object());
    }

    #[test]
    fn load_hand_written_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hand.json");
        std::fs::write(
            &path,
            r#"{
                "format_version": 1,
                "label": "play",
                "attributes": ["temp"],
                "threshold_policy": "median",
                "tree": {
                    "Attribute": "temp",
                    "Threshold": 20.0,
                    "IsLeaf": false,
                    "Children": {
                        "<=20.00": {"Class": "Yes", "IsLeaf": true},
                        ">20.00": {"Class": "No", "IsLeaf": true}
                    }
                }
            }"#,
        )
        .unwrap();
        let tree = DecisionTree::load(&path).unwrap();
        assert_eq!(tree.threshold_policy(), ThresholdPolicy::Median);
        assert_eq!(tree.predict(&record(&[("temp", "12")])), "Yes");
        assert_eq!(tree.predict(&record(&[("temp", "21")])), "No");
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = DecisionTree::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, TreeError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, b"not a model").unwrap();
        let err = DecisionTree::load(&path).unwrap_err();
        assert!(matches!(err, TreeError::DeserializeModel { .. }));
    }

    #[test]
    fn load_wrong_version_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v99.json");
        std::fs::write(
            &path,
            r#"{"format_version": 99, "label": "y", "attributes": [],
                "threshold_policy": "midpoint", "tree": {"Class": "a", "IsLeaf": true}}"#,
        )
        .unwrap();
        let err = DecisionTree::load(&path).unwrap_err();
        assert!(matches!(
            err,
            TreeError::IncompatibleModelVersion { expected: 1, found: 99, .. }
        ));
    }

    #[test]
    fn load_malformed_nodes_error() {
        let dir = TempDir::new().unwrap();
        let cases = [
            r#"{"Class": "a", "IsLeaf": true, "Children": {"x": {"Class": "b", "IsLeaf": true}}}"#,
            r#"{"IsLeaf": false, "Children": {"x": {"Class": "b", "IsLeaf": true}}}"#,
            r#"{"Attribute": "t", "IsLeaf": false}"#,
            r#"{"Attribute": "t", "Threshold": 1.0, "IsLeaf": false,
                "Children": {"<=1.00": {"Class": "b", "IsLeaf": true}}}"#,
        ];
        for (i, node) in cases.iter().enumerate() {
            let path = dir.path().join(format!("bad{i}.json"));
            let body = format!(
                r#"{{"format_version": 1, "label": "y", "attributes": ["t"],
                    "threshold_policy": "midpoint", "tree": {node}}}"#
            );
            std::fs::write(&path, body).unwrap();
            let err = DecisionTree::load(&path).unwrap_err();
            assert!(matches!(err, TreeError::MalformedModel { .. }), "case {i}: {err}");
        }
    }

    #[test]
    fn save_to_missing_directory_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join("model.json");
        let err = train_simple_model().save(&path).unwrap_err();
        assert!(matches!(err, TreeError::WriteModel { .. }));
    }

    /// A right-leaning chain of threshold nodes `depth` levels deep.
    fn chain(depth: usize) -> DecisionTree {
        let mut node = Node::leaf("end");
        for d in (0..depth).rev() {
            let t = d as f64;
            let mut children = BTreeMap::new();
            children.insert(le_key(t), Node::leaf("a"));
            children.insert(gt_key(t), node);
            node = Node::Internal {
                attribute: "t".into(),
                test: SplitTest::Threshold(t),
                children,
            };
        }
        DecisionTree {
            root: node,
            attributes: vec!["t".into()],
            label: "y".into(),
            threshold_policy: ThresholdPolicy::Midpoint,
        }
    }

    #[test]
    fn nesting_limit_matches_deepest_tree() {
        let tree = chain(MAX_MODEL_DEPTH);
        assert_eq!(tree.depth(), MAX_MODEL_DEPTH);
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            label: tree.label.clone(),
            attributes: tree.attributes.clone(),
            threshold_policy: tree.threshold_policy,
            tree: NodeRecord::from(&tree.root),
        };
        let json = serde_json::to_vec(&envelope).unwrap();
        assert_eq!(json_nesting(&json, usize::MAX), MAX_JSON_NESTING);
    }

    #[test]
    fn nesting_ignores_brackets_in_strings() {
        assert_eq!(json_nesting(br#"{"a": "{[{[", "b": "\"{", "c": "\\"}"#, usize::MAX), 1);
        assert_eq!(json_nesting(br#"[[[]], {"x": [1]}]"#, usize::MAX), 3);
    }

    #[test]
    fn deep_chain_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.json");
        let tree = chain(64);
        tree.save(&path).unwrap();
        let loaded = DecisionTree::load(&path).unwrap();
        assert_eq!(loaded.depth(), 64);
        assert_eq!(loaded.predict(&record(&[("t", "1000")])), "end");
        assert_eq!(loaded.predict(&record(&[("t", "10")])), "a");
    }

    #[test]
    fn save_too_deep_tree_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep.json");
        let err = chain(MAX_MODEL_DEPTH + 1).save(&path).unwrap_err();
        assert!(matches!(
            err,
            TreeError::ModelTooDeep { depth, max_depth: MAX_MODEL_DEPTH } if depth == MAX_MODEL_DEPTH + 1
        ));
        assert!(!path.exists());
    }

    #[test]
    fn load_hostile_nesting_error() {
        let levels = 100_000;
        let mut body = String::from(
            r#"{"format_version": 1, "label": "y", "attributes": ["t"], "threshold_policy": "midpoint", "tree": "#,
        );
        for _ in 0..levels {
            body.push_str(r#"{"Attribute": "t", "IsLeaf": false, "Children": {"k": "#);
        }
        body.push_str(r#"{"Class": "a", "IsLeaf": true}"#);
        for _ in 0..levels {
            body.push_str("}}");
        }
        body.push('}');

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostile.json");
        std::fs::write(&path, body).unwrap();
        let err = DecisionTree::load(&path).unwrap_err();
        assert!(matches!(err, TreeError::MalformedModel { .. }), "{err}");
    }
}
