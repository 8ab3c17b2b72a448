use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::encoder::ClassIndex;
use super::error::{ArtifactKind, PipelineError};
use super::tree::RegressionTree;
use super::utils::argmax;
use super::ClassModel;
use crate::artifacts::{self, ArtifactDocument, ARTIFACT_FORMAT_VERSION};

/// Gradient-boosted ensemble of regression trees for classification.
///
/// Each boosting stage holds one tree per class (a single tree when there are
/// two classes). The raw score of class `k` is
/// `init_raw[k] + learning_rate * sum(stage[k](x))`, accumulated stage by stage.
///
/// # Example
/// ```
/// use crop_advisor::{ClassModel, GradientBoostingModel, RegressionTree};
/// use ndarray::array;
///
/// let model = GradientBoostingModel::new(
///     1,
///     3,
///     1.0,
///     vec![0.0, 0.0, 0.0],
///     vec![vec![
///         RegressionTree::stump(0, 0.0, 1.0, -1.0),
///         RegressionTree::leaf(0.0),
///         RegressionTree::stump(0, 0.0, -1.0, 1.0),
///     ]],
/// ).unwrap();
///
/// assert_eq!(model.predict(array![-3.0].view()).unwrap().0, 0);
/// assert_eq!(model.predict(array![3.0].view()).unwrap().0, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    version: u32,
    n_features: usize,
    n_classes: usize,
    learning_rate: f64,
    init_raw: Vec<f64>,
    stages: Vec<Vec<RegressionTree>>,
}

impl GradientBoostingModel {
    pub fn new(
        n_features: usize,
        n_classes: usize,
        learning_rate: f64,
        init_raw: Vec<f64>,
        stages: Vec<Vec<RegressionTree>>,
    ) -> Result<Self, PipelineError> {
        let model = Self {
            version: ARTIFACT_FORMAT_VERSION,
            n_features,
            n_classes,
            learning_rate,
            init_raw,
            stages,
        };
        model
            .validate()
            .map_err(|reason| PipelineError::artifact_load(ArtifactKind::Classifier, "<in-memory>", reason))?;
        Ok(model)
    }

    /// Parses a classifier artifact from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        artifacts::parse_document(json.as_bytes(), "<inline>")
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of raw scores per sample: one per class, or one for binary models
    fn score_width(&self) -> usize {
        if self.n_classes == 2 {
            1
        } else {
            self.n_classes
        }
    }

    /// Raw (pre-link) scores for one sample.
    pub fn decision_function(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, PipelineError> {
        if x.len() != self.n_features {
            return Err(PipelineError::Inference(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                x.len()
            )));
        }
        let mut raw = Array1::from_vec(self.init_raw.clone());
        for stage in &self.stages {
            for (score, tree) in raw.iter_mut().zip(stage) {
                *score += self.learning_rate * tree.predict(x);
            }
        }
        Ok(raw)
    }
}

impl ClassModel for GradientBoostingModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> Result<ClassIndex, PipelineError> {
        let raw = self.decision_function(x)?;
        if self.n_classes == 2 {
            return Ok(ClassIndex(usize::from(raw[0] > 0.0)));
        }
        argmax(raw.view())
            .map(ClassIndex)
            .ok_or_else(|| PipelineError::Inference("classifier produced no scores".into()))
    }

    fn backend(&self) -> &'static str {
        "gradient-boosting"
    }

    fn num_stages(&self) -> Option<usize> {
        Some(self.stages.len())
    }
}

impl ArtifactDocument for GradientBoostingModel {
    const KIND: ArtifactKind = ArtifactKind::Classifier;

    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("model has no input features".into());
        }
        if self.n_classes < 2 {
            return Err(format!("model needs at least 2 classes, has {}", self.n_classes));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(format!("learning rate {} must be positive", self.learning_rate));
        }
        let width = self.score_width();
        if self.init_raw.len() != width {
            return Err(format!(
                "init_raw has {} entries, expected {}",
                self.init_raw.len(),
                width
            ));
        }
        if self.init_raw.iter().any(|v| !v.is_finite()) {
            return Err("init_raw contains a non-finite value".into());
        }
        if self.stages.is_empty() {
            return Err("model has no boosting stages".into());
        }
        for (s, stage) in self.stages.iter().enumerate() {
            if stage.len() != width {
                return Err(format!("stage {} has {} trees, expected {}", s, stage.len(), width));
            }
            for (k, tree) in stage.iter().enumerate() {
                tree.validate(self.n_features)
                    .map_err(|e| format!("stage {} tree {}: {}", s, k, e))?;
            }
        }
        Ok(())
    }
}
