use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

use log::{error, info};

use crate::artifacts::{ArtifactStore, ModelArtifacts};
use crate::classifier::{CropRecommender, PipelineError};

/// Somewhere model artifacts can be loaded from.
pub trait ArtifactSource: Send + Sync {
    /// Deserializes all three artifacts. Called at most once per successful
    /// [`ModelContext`] initialization.
    fn load(&self) -> Result<ModelArtifacts, PipelineError>;

    /// Human-readable origin, used in logs and [`crate::RecommenderInfo`]
    fn describe(&self) -> String;
}

/// Holds the model artifacts for the lifetime of the caller, loading them on first use.
///
/// Concurrent first callers block on a single load; every caller then sees the
/// same `Arc`. A failed load is not cached, so the error reaches the caller
/// that triggered it.
///
/// # Example
/// ```no_run
/// # fn main() -> Result<(), crop_advisor::PipelineError> {
/// use crop_advisor::{ArtifactStore, FeatureVector, ModelContext};
///
/// let context = ModelContext::new(ArtifactStore::new("models"));
/// context.preload()?;
///
/// let crop = context.recommender()?.recommend(&FeatureVector::default())?;
/// println!("{}", crop);
/// # Ok(())
/// # }
/// ```
pub struct ModelContext {
    source: Option<Box<dyn ArtifactSource>>,
    description: String,
    artifacts: OnceLock<Arc<ModelArtifacts>>,
    init_lock: Mutex<()>,
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("source", &self.description)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ModelContext {
    pub fn new(source: impl ArtifactSource + 'static) -> Self {
        Self {
            description: source.describe(),
            source: Some(Box::new(source)),
            artifacts: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// A context over [`ArtifactStore::new_default`]
    pub fn from_default_dir() -> Self {
        Self::new(ArtifactStore::new_default())
    }

    /// A context that is already initialized with `artifacts`
    pub fn with_artifacts(artifacts: ModelArtifacts) -> Self {
        let context = Self {
            source: None,
            description: "<in-memory>".to_string(),
            artifacts: OnceLock::new(),
            init_lock: Mutex::new(()),
        };
        let _ = context.artifacts.set(Arc::new(artifacts));
        context
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub fn is_loaded(&self) -> bool {
        self.artifacts.get().is_some()
    }

    /// Returns the shared artifacts, loading them if this is the first call.
    pub fn artifacts(&self) -> Result<Arc<ModelArtifacts>, PipelineError> {
        if let Some(artifacts) = self.artifacts.get() {
            return Ok(Arc::clone(artifacts));
        }

        // The mutex guards no data, a poisoned lock is still usable
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(artifacts) = self.artifacts.get() {
            return Ok(Arc::clone(artifacts));
        }

        let source = self.source.as_ref().ok_or_else(|| {
            PipelineError::artifact_load(
                crate::classifier::ArtifactKind::Classifier,
                &self.description,
                "context has no artifact source",
            )
        })?;

        info!("Loading model artifacts from {}", self.description);
        let start = Instant::now();
        let loaded = match source.load() {
            Ok(artifacts) => Arc::new(artifacts),
            Err(e) => {
                error!("Failed to load model artifacts: {}", e);
                return Err(e);
            }
        };
        info!("Model artifacts loaded (took {:.2?})", start.elapsed());

        let _ = self.artifacts.set(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Loads the artifacts now so failures surface before the first prediction.
    pub fn preload(&self) -> Result<(), PipelineError> {
        self.artifacts().map(|_| ())
    }

    pub fn recommender(&self) -> Result<CropRecommender, PipelineError> {
        Ok(CropRecommender::new(self.artifacts()?, self.description.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{GradientBoostingModel, LabelEncoder, RegressionTree, StandardScaler};
    use crate::FeatureVector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn artifacts() -> ModelArtifacts {
        ModelArtifacts::new(
            StandardScaler::new(vec![0.0; 7], vec![1.0; 7]).unwrap(),
            LabelEncoder::new(vec!["lentil", "mango"]).unwrap(),
            Arc::new(
                GradientBoostingModel::new(7, 2, 1.0, vec![1.0], vec![vec![RegressionTree::leaf(0.0)]]).unwrap(),
            ),
        )
        .unwrap()
    }

    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    impl ArtifactSource for FlakySource {
        fn load(&self) -> Result<ModelArtifacts, PipelineError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PipelineError::artifact_load(
                    crate::classifier::ArtifactKind::Scaler,
                    "flaky",
                    "disk hiccup",
                ))
            } else {
                Ok(artifacts())
            }
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    #[test]
    fn test_preloaded_context() {
        let context = ModelContext::with_artifacts(artifacts());
        assert!(context.is_loaded());
        let crop = context.recommender().unwrap().recommend(&FeatureVector::default()).unwrap();
        assert_eq!(crop, "mango");
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let context = ModelContext::new(FlakySource { calls: Arc::clone(&calls) });
        assert!(context.preload().is_err());
        assert!(!context.is_loaded());

        assert!(context.preload().is_ok());
        assert!(context.preload().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_same_instance_after_load() {
        let calls = Arc::new(AtomicUsize::new(1));
        let context = ModelContext::new(FlakySource { calls });
        let first = context.artifacts().unwrap();
        let second = context.artifacts().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(format!("{:?}", context), "ModelContext { source: \"flaky\", loaded: true }");
    }
}
