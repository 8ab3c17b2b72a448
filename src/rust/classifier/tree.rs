use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Child index marking a leaf node.
pub const TREE_LEAF: i64 = -1;
/// Feature index stored on leaf nodes.
pub const TREE_UNDEFINED: i64 = -2;

/// A fitted regression tree in flattened array form.
///
/// Node `i` is a leaf when `children_left[i] == children_right[i] == -1`;
/// otherwise samples with `x[feature[i]] <= threshold[i]` go left.
/// Children always come after their parent, so traversal terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl RegressionTree {
    /// Wraps node arrays as exported from training. Call [`RegressionTree::validate`]
    /// before predicting with a tree built this way.
    pub fn new(
        children_left: Vec<i64>,
        children_right: Vec<i64>,
        feature: Vec<i64>,
        threshold: Vec<f64>,
        value: Vec<f64>,
    ) -> Self {
        Self {
            children_left,
            children_right,
            feature,
            threshold,
            value,
        }
    }

    /// A single-node tree that always predicts `value`.
    pub fn leaf(value: f64) -> Self {
        Self::new(vec![TREE_LEAF], vec![TREE_LEAF], vec![TREE_UNDEFINED], vec![-2.0], vec![value])
    }

    /// A depth-one tree splitting on a single feature.
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self::new(
            vec![1, TREE_LEAF, TREE_LEAF],
            vec![2, TREE_LEAF, TREE_LEAF],
            vec![feature as i64, TREE_UNDEFINED, TREE_UNDEFINED],
            vec![threshold, -2.0, -2.0],
            vec![0.0, left, right],
        )
    }

    pub fn node_count(&self) -> usize {
        self.value.len()
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.children_left.get(node) == Some(&TREE_LEAF)
    }

    /// Checks the node arrays are consistent for a model with `n_features` inputs.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        let n_nodes = self.value.len();
        if n_nodes == 0 {
            return Err("tree has no nodes".into());
        }
        let lengths = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if lengths.iter().any(|&len| len != n_nodes) {
            return Err(format!("node arrays have unequal lengths {:?} and {}", lengths, n_nodes));
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {} has only one child", node));
                }
                if !self.value[node].is_finite() {
                    return Err(format!("leaf {} has a non-finite value", node));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n_nodes as i64 {
                    return Err(format!("node {} points to invalid child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!(
                    "node {} splits on feature {} but the model has {} features",
                    node, feature, n_features
                ));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {} has a NaN threshold", node));
            }
        }
        Ok(())
    }

    /// Returns the leaf value reached by `x`.
    ///
    /// Features are compared in single precision, matching how the trees were
    /// fitted. A NaN feature never satisfies `<=` and goes right.
    ///
    /// Only called on trees that passed [`RegressionTree::validate`] for the
    /// width of `x`.
    pub(crate) fn predict(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return self.value[node];
            }
            let sample = x[self.feature[node] as usize] as f32;
            node = if f64::from(sample) <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}
