use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use super::encoder::LabelEncoder;
use super::error::{ArtifactKind, PipelineError};
use super::pipeline::CropRecommender;
use super::scaler::StandardScaler;
use super::ClassModel;
use crate::artifacts::{ArtifactStore, ModelArtifacts};
#[cfg(feature = "onnx")]
use crate::runtime::RuntimeConfig;

/// A builder for constructing a CropRecommender with a fluent interface.
///
/// Artifacts given explicitly take precedence; anything left unset is loaded
/// from the configured [`ArtifactStore`].
#[derive(Default, Debug)]
pub struct RecommenderBuilder {
    store: Option<ArtifactStore>,
    scaler: Option<StandardScaler>,
    encoder: Option<LabelEncoder>,
    classifier: Option<Arc<dyn ClassModel>>,
    #[cfg(feature = "onnx")]
    runtime_config: RuntimeConfig,
}

impl RecommenderBuilder {
    /// Creates a new empty RecommenderBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads missing artifacts from `store`
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Loads missing artifacts from the default file names inside `dir`
    ///
    /// # Example
    /// ```
    /// use crop_advisor::RecommenderBuilder;
    ///
    /// let builder = RecommenderBuilder::new().with_models_dir("models");
    /// ```
    pub fn with_models_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_store(ArtifactStore::new(dir.into()))
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_encoder(mut self, encoder: LabelEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Replaces the classifier backend
    pub fn with_classifier(mut self, classifier: impl ClassModel + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Sets the runtime configuration for ONNX model execution
    #[cfg(feature = "onnx")]
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Uses a converted ONNX model as the classifier backend
    ///
    /// # Returns
    /// * `Result<Self, PipelineError>` - The builder instance if successful, or an error if:
    ///   - The model path is empty or does not exist
    ///   - A classifier has already been set
    ///   - The ONNX session could not be created
    #[cfg(feature = "onnx")]
    pub fn with_onnx_model(
        mut self,
        model_path: &str,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, PipelineError> {
        if self.classifier.is_some() {
            return Err(PipelineError::artifact_load(
                ArtifactKind::Classifier,
                model_path,
                "a classifier is already set",
            ));
        }
        let model = super::onnx::OnnxClassifier::from_file(model_path, n_features, n_classes, &self.runtime_config)?;
        self.classifier = Some(Arc::new(model));
        Ok(self)
    }

    /// Builds and returns the final CropRecommender instance
    ///
    /// # Returns
    /// * `Result<CropRecommender, PipelineError>` - The recommender if successful, or an error if:
    ///   - An artifact is neither given nor available from a store
    ///   - An artifact fails to load
    ///   - The three artifacts do not fit together
    pub fn build(self) -> Result<CropRecommender, PipelineError> {
        let source = match &self.store {
            Some(store) => store.models_dir().display().to_string(),
            None => "<in-memory>".to_string(),
        };
        let store = self.store.as_ref();

        let scaler = match self.scaler {
            Some(scaler) => scaler,
            None => require(store, ArtifactKind::Scaler)?.load_scaler()?,
        };
        let encoder = match self.encoder {
            Some(encoder) => encoder,
            None => require(store, ArtifactKind::Encoder)?.load_encoder()?,
        };
        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::new(require(store, ArtifactKind::Classifier)?.load_classifier()?) as Arc<dyn ClassModel>,
        };

        let artifacts = ModelArtifacts::new(scaler, encoder, classifier)?;
        info!(
            "Recommender ready: {} classes, {} backend (from {})",
            artifacts.encoder.len(),
            artifacts.classifier.backend(),
            source
        );
        Ok(CropRecommender::new(Arc::new(artifacts), source))
    }
}

fn require(store: Option<&ArtifactStore>, kind: ArtifactKind) -> Result<&ArtifactStore, PipelineError> {
    store.ok_or_else(|| PipelineError::artifact_load(kind, "<none>", "no artifact given and no artifact store configured"))
}
