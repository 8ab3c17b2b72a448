use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{ArtifactKind, ClassModel, GradientBoostingModel, LabelEncoder, PipelineError, StandardScaler};
use crate::context::ArtifactSource;
use crate::features::Feature;

/// Format version written into every artifact document.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Environment variable overriding the models directory
pub const MODELS_DIR_ENV: &str = "CROP_ADVISOR_MODELS";

/// Name of the optional digest manifest inside the models directory
pub const DIGEST_MANIFEST: &str = "digests.json";

/// A JSON artifact with a format version and internal consistency rules.
pub(crate) trait ArtifactDocument: DeserializeOwned {
    const KIND: ArtifactKind;

    fn version(&self) -> u32;

    fn validate(&self) -> Result<(), String>;
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Parses and validates an artifact. `location` is only used in error messages.
pub(crate) fn parse_document<T: ArtifactDocument>(bytes: &[u8], location: &str) -> Result<T, PipelineError> {
    let probe: VersionProbe = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::artifact_load(T::KIND, location, format!("not a valid artifact document: {}", e)))?;
    if probe.version != ARTIFACT_FORMAT_VERSION {
        return Err(PipelineError::artifact_load(
            T::KIND,
            location,
            format!(
                "unsupported format version {} (expected {})",
                probe.version, ARTIFACT_FORMAT_VERSION
            ),
        ));
    }

    let document: T = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::artifact_load(T::KIND, location, format!("corrupted artifact: {}", e)))?;
    debug_assert_eq!(document.version(), ARTIFACT_FORMAT_VERSION);
    document
        .validate()
        .map_err(|reason| PipelineError::artifact_load(T::KIND, location, reason))?;
    Ok(document)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// The three artifacts a recommender runs on, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub encoder: LabelEncoder,
    pub classifier: Arc<dyn ClassModel>,
}

impl ModelArtifacts {
    /// Bundles the artifacts after checking they were trained together.
    pub fn new(
        scaler: StandardScaler,
        encoder: LabelEncoder,
        classifier: Arc<dyn ClassModel>,
    ) -> Result<Self, PipelineError> {
        if scaler.n_features() != Feature::COUNT {
            return Err(PipelineError::artifact_load(
                ArtifactKind::Scaler,
                "<artifact set>",
                format!("scaler has {} features, expected {}", scaler.n_features(), Feature::COUNT),
            ));
        }
        if classifier.n_features() != scaler.n_features() {
            return Err(PipelineError::artifact_load(
                ArtifactKind::Classifier,
                "<artifact set>",
                format!(
                    "classifier expects {} features but the scaler produces {}",
                    classifier.n_features(),
                    scaler.n_features()
                ),
            ));
        }
        if classifier.n_classes() != encoder.len() {
            return Err(PipelineError::artifact_load(
                ArtifactKind::Classifier,
                "<artifact set>",
                format!(
                    "classifier predicts {} classes but the label encoder has {}",
                    classifier.n_classes(),
                    encoder.len()
                ),
            ));
        }
        Ok(Self { scaler, encoder, classifier })
    }
}

/// File names of the artifacts inside the models directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub scaler: String,
    pub encoder: String,
    pub classifier: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            scaler: "scaler.json".to_string(),
            encoder: "encoder.json".to_string(),
            classifier: "model_gbc.json".to_string(),
        }
    }
}

impl ArtifactPaths {
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Scaler => &self.scaler,
            ArtifactKind::Encoder => &self.encoder,
            ArtifactKind::Classifier => &self.classifier,
        }
    }
}

/// Expected SHA-256 digests (lower-case hex) of the artifact files.
/// Artifacts without a digest are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDigests {
    #[serde(default)]
    pub scaler: Option<String>,
    #[serde(default)]
    pub encoder: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
}

impl ArtifactDigests {
    pub fn get(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Scaler => self.scaler.as_deref(),
            ArtifactKind::Encoder => self.encoder.as_deref(),
            ArtifactKind::Classifier => self.classifier.as_deref(),
        }
    }
}

/// Reads model artifacts from a directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    models_dir: PathBuf,
    paths: ArtifactPaths,
    digests: Option<ArtifactDigests>,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore over the default models directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(MODELS_DIR_ENV) {
            return PathBuf::from(path);
        }

        // 2. A models directory next to the working directory
        let local = PathBuf::from("models");
        if local.is_dir() {
            return local;
        }

        // 3. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("crop-advisor").join("models");
        }

        // 4. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".crop-advisor").join("models");
        }

        // 5. If all else fails, use system temp directory
        env::temp_dir().join("crop-advisor").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
            paths: ArtifactPaths::default(),
            digests: None,
        }
    }

    pub fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_digests(mut self, digests: ArtifactDigests) -> Self {
        self.digests = Some(digests);
        self
    }

    /// Picks up `digests.json` from the models directory if one exists.
    pub fn with_digest_manifest(self) -> Result<Self, PipelineError> {
        let manifest = self.models_dir.join(DIGEST_MANIFEST);
        if !manifest.exists() {
            log::debug!("No digest manifest at {:?}", manifest);
            return Ok(self);
        }
        log::info!("Reading digest manifest {:?}", manifest);
        let manifest_error = |reason: String| PipelineError::DigestManifest {
            path: manifest.display().to_string(),
            reason,
        };
        let bytes = fs::read(&manifest).map_err(|e| manifest_error(format!("cannot read file: {}", e)))?;
        let digests: ArtifactDigests =
            serde_json::from_slice(&bytes).map_err(|e| manifest_error(format!("not a digest table: {}", e)))?;
        Ok(self.with_digests(digests))
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn digests(&self) -> Option<&ArtifactDigests> {
        self.digests.as_ref()
    }

    pub fn get_artifact_path(&self, kind: ArtifactKind) -> PathBuf {
        self.models_dir.join(self.paths.get(kind))
    }

    /// Whether all three artifact files exist
    pub fn is_present(&self) -> bool {
        log::info!("Checking for model artifacts in {:?}", self.models_dir);
        ArtifactKind::ALL.iter().all(|&kind| {
            let path = self.get_artifact_path(kind);
            log::info!("  {} path: {:?} (exists: {})", kind, path, path.exists());
            path.exists()
        })
    }

    /// Whether every artifact exists and matches its expected digest.
    /// Artifacts without a configured digest only need to exist.
    pub fn verify(&self) -> Result<bool, PipelineError> {
        if !self.is_present() {
            log::info!("One or more artifacts do not exist");
            return Ok(false);
        }

        let mut all_ok = true;
        for kind in ArtifactKind::ALL {
            let Some(expected) = self.digests.as_ref().and_then(|d| d.get(kind)) else {
                log::info!("  {}: no digest configured", kind);
                continue;
            };
            let path = self.get_artifact_path(kind);
            let bytes = fs::read(&path).map_err(|e| PipelineError::artifact_load(kind, path.display(), e.to_string()))?;
            let actual = sha256_hex(&bytes);
            let ok = actual.eq_ignore_ascii_case(expected);
            log::info!("  {} hash verification: {}", kind, ok);
            all_ok &= ok;
        }
        Ok(all_ok)
    }

    fn read_artifact(&self, kind: ArtifactKind) -> Result<Vec<u8>, PipelineError> {
        let path = self.get_artifact_path(kind);
        log::debug!("Reading {} artifact from {:?}", kind, path);
        let bytes = fs::read(&path).map_err(|e| PipelineError::artifact_load(kind, path.display(), e.to_string()))?;

        if let Some(expected) = self.digests.as_ref().and_then(|d| d.get(kind)) {
            let actual = sha256_hex(&bytes);
            log::debug!("Calculated hash: {}", actual);
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", kind, expected, actual);
                return Err(PipelineError::artifact_load(
                    kind,
                    path.display(),
                    format!("hash mismatch: expected {}, got {}", expected, actual),
                ));
            }
        }
        Ok(bytes)
    }

    fn load_document<T: ArtifactDocument>(&self) -> Result<T, PipelineError> {
        let bytes = self.read_artifact(T::KIND)?;
        let path = self.get_artifact_path(T::KIND);
        parse_document(&bytes, &path.display().to_string())
    }

    pub fn load_scaler(&self) -> Result<StandardScaler, PipelineError> {
        self.load_document()
    }

    pub fn load_encoder(&self) -> Result<LabelEncoder, PipelineError> {
        self.load_document()
    }

    pub fn load_classifier(&self) -> Result<GradientBoostingModel, PipelineError> {
        self.load_document()
    }

    /// Loads and cross-checks all three artifacts.
    pub fn load(&self) -> Result<ModelArtifacts, PipelineError> {
        let scaler = self.load_scaler()?;
        let encoder = self.load_encoder()?;
        let classifier = self.load_classifier()?;
        log::info!(
            "Loaded artifacts from {:?}: {} features, {} classes, {} boosting stages",
            self.models_dir,
            scaler.n_features(),
            encoder.len(),
            classifier.n_stages()
        );
        ModelArtifacts::new(scaler, encoder, Arc::new(classifier))
    }
}

impl ArtifactSource for ArtifactStore {
    fn load(&self) -> Result<ModelArtifacts, PipelineError> {
        ArtifactStore::load(self)
    }

    fn describe(&self) -> String {
        self.models_dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        // Test with environment variable
        env::set_var(MODELS_DIR_ENV, "/tmp/crop-advisor-test/models");
        let path = ArtifactStore::get_default_models_dir();
        assert_eq!(path, PathBuf::from("/tmp/crop-advisor-test/models"));
        env::remove_var(MODELS_DIR_ENV);

        // Test without environment variable
        let path = ArtifactStore::get_default_models_dir();
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_artifact_paths() {
        let store = ArtifactStore::new("/srv/models");
        assert_eq!(store.get_artifact_path(ArtifactKind::Scaler), PathBuf::from("/srv/models/scaler.json"));
        assert_eq!(store.get_artifact_path(ArtifactKind::Encoder), PathBuf::from("/srv/models/encoder.json"));
        assert_eq!(store.get_artifact_path(ArtifactKind::Classifier), PathBuf::from("/srv/models/model_gbc.json"));

        let store = store.with_paths(ArtifactPaths {
            classifier: "gbc_v2.json".into(),
            ..ArtifactPaths::default()
        });
        assert!(store.get_artifact_path(ArtifactKind::Classifier).ends_with("gbc_v2.json"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_version_mismatch() {
        let err = parse_document::<LabelEncoder>(br#"{"version": 2, "classes": ["rice"]}"#, "encoder.json").unwrap_err();
        match err {
            PipelineError::ArtifactLoad { artifact, reason, .. } => {
                assert_eq!(artifact, ArtifactKind::Encoder);
                assert!(reason.contains("unsupported format version 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let err = parse_document::<LabelEncoder>(br#"{"classes": ["rice"]}"#, "encoder.json").unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_corrupted_document() {
        let err = parse_document::<StandardScaler>(b"\x80\x04\x95pickle", "scaler.json").unwrap_err();
        assert!(err.to_string().contains("scaler"));

        let err = parse_document::<StandardScaler>(br#"{"version": 1, "mean": "oops"}"#, "scaler.json").unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }
}
