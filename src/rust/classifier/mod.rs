use std::fmt::Debug;

use ndarray::ArrayView1;

mod error;
mod encoder;
mod ensemble;
mod pipeline;
mod scaler;
mod tree;
mod utils;
pub mod builder;
#[cfg(feature = "onnx")]
mod onnx;

pub use builder::RecommenderBuilder;
pub use encoder::{ClassIndex, CropLabel, LabelEncoder};
pub use ensemble::GradientBoostingModel;
pub use error::{ArtifactKind, PipelineError};
pub use pipeline::{recommend, CropRecommender};
pub use scaler::StandardScaler;
pub use tree::RegressionTree;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

/// A pre-trained model mapping a scaled feature vector to a single class.
///
/// Implementations must be deterministic: the same input always yields the same index.
pub trait ClassModel: Debug + Send + Sync {
    /// Number of inputs the model was fitted on
    fn n_features(&self) -> usize;

    /// Number of classes the model can predict
    fn n_classes(&self) -> usize;

    /// Predicts the most probable class for one scaled sample.
    ///
    /// # Errors
    /// - `Inference` if the sample does not have `n_features` values
    fn predict(&self, x: ArrayView1<'_, f64>) -> Result<ClassIndex, PipelineError>;

    /// Short name of the inference backend
    fn backend(&self) -> &'static str;

    /// Number of boosting stages, for backends that have them
    fn num_stages(&self) -> Option<usize> {
        None
    }
}

/// Information about a loaded recommender
#[derive(Debug, Clone)]
pub struct RecommenderInfo {
    /// Where the artifacts were loaded from
    pub source: String,
    /// Column names in the order the scaler expects
    pub feature_names: Vec<String>,
    /// Crop labels in class-index order
    pub class_labels: Vec<String>,
    pub num_classes: usize,
    /// Boosting stages of the classifier, when the backend exposes them
    pub num_stages: Option<usize>,
    /// Inference backend of the classifier
    pub backend: &'static str,
}
