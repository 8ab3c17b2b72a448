#![allow(dead_code)]

use std::path::PathBuf;

use crop_advisor::{ArtifactStore, CropRecommender, ModelContext};
use env_logger::{Builder, Env};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn fixture_store() -> ArtifactStore {
    ArtifactStore::new(fixtures_dir())
}

pub fn fixture_recommender() -> CropRecommender {
    init();
    ModelContext::new(fixture_store())
        .recommender()
        .expect("fixture artifacts should load")
}

/// Labels known to the fixture encoder
pub const FIXTURE_LABELS: [&str; 3] = ["chickpea", "maize", "rice"];
