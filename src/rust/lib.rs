//! Crop recommendation from soil and climate readings.
//!
//! Seven readings (N, P, K, temperature, humidity, ph, rainfall) go through a
//! pre-fitted standard scaler, a gradient-boosted tree ensemble and a label
//! encoder to produce the name of the most suitable crop. The three artifacts
//! are JSON documents exported after training and are loaded once.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use crop_advisor::{ArtifactStore, FeatureVector, ModelContext};
//!
//! let context = ModelContext::new(ArtifactStore::new("models"));
//! let recommender = context.recommender()?;
//!
//! let readings = FeatureVector::new(90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9);
//! let crop = recommender.recommend(&readings.clamped())?;
//! println!("Best crop: {}", crop.display_name());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`ModelContext`] performs a single guarded load no matter how many threads
//! ask for the artifacts first; afterwards the artifacts are shared read-only:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use crop_advisor::{recommend, ModelContext};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let context = Arc::new(ModelContext::from_default_dir());
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let context = Arc::clone(&context);
//!     handles.push(thread::spawn(move || {
//!         recommend(&context, 50.0, 50.0, 50.0, 25.0, 80.0, 6.5, 100.0).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod context;
pub mod features;
#[cfg(feature = "onnx")]
pub mod runtime;

pub use artifacts::{ArtifactDigests, ArtifactPaths, ArtifactStore, ModelArtifacts};
pub use classifier::{
    recommend, ArtifactKind, ClassIndex, ClassModel, CropLabel, CropRecommender, GradientBoostingModel, LabelEncoder,
    PipelineError, RecommenderBuilder, RecommenderInfo, RegressionTree, StandardScaler,
};
pub use context::{ArtifactSource, ModelContext};
pub use features::{Feature, FeatureVector};
#[cfg(feature = "onnx")]
pub use classifier::OnnxClassifier;
#[cfg(feature = "onnx")]
pub use runtime::{OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
