use std::sync::Arc;

use log::debug;

use super::builder::RecommenderBuilder;
use super::encoder::CropLabel;
use super::error::PipelineError;
use super::RecommenderInfo;
use crate::artifacts::ModelArtifacts;
use crate::context::ModelContext;
use crate::features::{Feature, FeatureVector};

/// Turns soil and climate readings into a crop recommendation.
///
/// Runs the scaler, the classifier and the label decoder in sequence. Errors
/// from any stage are returned unchanged; nothing is retried since every stage
/// is deterministic.
///
/// # Thread Safety
///
/// The artifacts are shared read-only through an `Arc`, so a recommender can be
/// cloned cheaply or shared between threads:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use crop_advisor::{CropRecommender, FeatureVector};
/// use std::sync::Arc;
/// use std::thread;
///
/// let recommender = Arc::new(CropRecommender::builder().with_models_dir("models").build()?);
///
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let recommender = Arc::clone(&recommender);
///         thread::spawn(move || recommender.recommend(&FeatureVector::default()).unwrap())
///     })
///     .collect();
///
/// for handle in handles {
///     println!("{}", handle.join().unwrap());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CropRecommender {
    artifacts: Arc<ModelArtifacts>,
    source: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<CropRecommender>();
        assert_send_sync::<ModelContext>();
    }
};

impl CropRecommender {
    /// Creates a new RecommenderBuilder for fluent construction
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::new()
    }

    pub fn new(artifacts: Arc<ModelArtifacts>, source: impl Into<String>) -> Self {
        Self {
            artifacts,
            source: source.into(),
        }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> RecommenderInfo {
        let feature_names = match self.artifacts.scaler.feature_names() {
            Some(names) => names.to_vec(),
            None => Feature::ALL.iter().map(|f| f.name().to_string()).collect(),
        };
        RecommenderInfo {
            source: self.source.clone(),
            feature_names,
            class_labels: self.artifacts.encoder.classes().to_vec(),
            num_classes: self.artifacts.encoder.len(),
            num_stages: self.artifacts.classifier.num_stages(),
            backend: self.artifacts.classifier.backend(),
        }
    }

    /// Crop labels this recommender can return
    pub fn labels(&self) -> &[String] {
        self.artifacts.encoder.classes()
    }

    /// Recommends a crop for the given readings.
    ///
    /// Readings are not range-checked here; callers clamp them first
    /// (see [`FeatureVector::clamped`]).
    pub fn recommend(&self, features: &FeatureVector) -> Result<CropLabel, PipelineError> {
        let scaled = self.artifacts.scaler.transform(features)?;
        let index = self.artifacts.classifier.predict(scaled.view())?;
        let label = self.artifacts.encoder.decode(index)?;
        debug!("Readings [{}] -> class {} ({})", features, index, label);
        Ok(label)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn recommend_readings(
        &self,
        n: f64,
        p: f64,
        k: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Result<CropLabel, PipelineError> {
        self.recommend(&FeatureVector::new(n, p, k, temperature, humidity, ph, rainfall))
    }
}

/// Recommends a crop using the artifacts held by `context`, loading them on first use.
///
/// # Example
/// ```no_run
/// # fn main() -> Result<(), crop_advisor::PipelineError> {
/// use crop_advisor::{recommend, ArtifactStore, ModelContext};
///
/// let context = ModelContext::new(ArtifactStore::new("models"));
/// let crop = recommend(&context, 90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9)?;
/// println!("Best crop: {}", crop.display_name());
/// # Ok(())
/// # }
/// ```
#[allow(clippy::too_many_arguments)]
pub fn recommend(
    context: &ModelContext,
    n: f64,
    p: f64,
    k: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
) -> Result<CropLabel, PipelineError> {
    context
        .recommender()?
        .recommend_readings(n, p, k, temperature, humidity, ph, rainfall)
}
