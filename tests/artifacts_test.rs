mod common;

use std::fs;
use std::path::Path;

use common::{fixture_store, fixtures_dir};
use crop_advisor::artifacts::sha256_hex;
use crop_advisor::{ArtifactDigests, ArtifactKind, ArtifactStore, PipelineError};
use tempfile::TempDir;

/// Copies the fixture artifacts into a fresh directory the test may damage.
fn scratch_models() -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    for name in ["scaler.json", "encoder.json", "model_gbc.json"] {
        fs::copy(fixtures_dir().join(name), dir.path().join(name))?;
    }
    Ok(dir)
}

fn digest_of(path: &Path) -> String {
    sha256_hex(&fs::read(path).unwrap())
}

fn assert_load_error(err: PipelineError, expected: ArtifactKind, fragment: &str) {
    match err {
        PipelineError::ArtifactLoad { artifact, reason, .. } => {
            assert_eq!(artifact, expected);
            assert!(reason.contains(fragment), "'{reason}' does not mention '{fragment}'");
        }
        other => panic!("expected an artifact load error, got {other}"),
    }
}

#[test]
fn test_fixture_loads() -> Result<(), PipelineError> {
    let store = fixture_store();
    assert!(store.is_present());
    let artifacts = store.load()?;
    assert_eq!(artifacts.scaler.n_features(), 7);
    assert_eq!(artifacts.encoder.len(), 3);
    assert_eq!(artifacts.classifier.n_classes(), 3);
    assert_eq!(store.load_classifier()?.n_stages(), 2);
    Ok(())
}

#[test]
fn test_missing_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    fs::remove_file(dir.path().join("encoder.json"))?;

    let store = ArtifactStore::new(dir.path());
    assert!(!store.is_present());
    assert!(!store.verify()?);
    let err = store.load().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactLoad { artifact: ArtifactKind::Encoder, .. }));
    assert!(err.to_string().contains("encoder.json"));
    Ok(())
}

#[test]
fn test_corrupted_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    fs::write(dir.path().join("model_gbc.json"), b"{\"version\": 1, \"n_features\": 7, \"stag")?;

    let err = ArtifactStore::new(dir.path()).load().unwrap_err();
    assert_load_error(err, ArtifactKind::Classifier, "not a valid artifact document");
    Ok(())
}

#[test]
fn test_incompatible_version() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    let path = dir.path().join("scaler.json");
    let text = fs::read_to_string(&path)?.replace("\"version\": 1", "\"version\": 3");
    fs::write(&path, text)?;

    let err = ArtifactStore::new(dir.path()).load().unwrap_err();
    assert_load_error(err, ArtifactKind::Scaler, "unsupported format version 3");
    Ok(())
}

#[test]
fn test_invalid_tree_is_rejected_at_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    let path = dir.path().join("model_gbc.json");
    let text = fs::read_to_string(&path)?.replacen("\"feature\": [4, -2, -2]", "\"feature\": [9, -2, -2]", 1);
    fs::write(&path, text)?;

    let err = ArtifactStore::new(dir.path()).load().unwrap_err();
    assert_load_error(err, ArtifactKind::Classifier, "splits on feature 9");
    Ok(())
}

#[test]
fn test_mismatched_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    fs::write(
        dir.path().join("encoder.json"),
        r#"{"version": 1, "classes": ["chickpea", "maize", "rice", "jute"]}"#,
    )?;

    let err = ArtifactStore::new(dir.path()).load().unwrap_err();
    assert_load_error(err, ArtifactKind::Classifier, "label encoder has 4");
    Ok(())
}

#[test]
fn test_digest_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;
    let digests = ArtifactDigests {
        scaler: Some(digest_of(&dir.path().join("scaler.json"))),
        encoder: Some(digest_of(&dir.path().join("encoder.json"))),
        classifier: Some(digest_of(&dir.path().join("model_gbc.json"))),
    };

    let store = ArtifactStore::new(dir.path()).with_digests(digests.clone());
    assert!(store.verify()?);
    assert!(store.load().is_ok());

    let tampered = ArtifactDigests {
        encoder: Some("0".repeat(64)),
        ..digests
    };
    let store = ArtifactStore::new(dir.path()).with_digests(tampered);
    assert!(!store.verify()?);
    assert_load_error(store.load().unwrap_err(), ArtifactKind::Encoder, "hash mismatch");
    Ok(())
}

#[test]
fn test_digest_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_models()?;

    // No manifest: nothing to check
    let store = ArtifactStore::new(dir.path()).with_digest_manifest()?;
    assert!(store.digests().is_none());

    let manifest = format!(
        r#"{{"scaler": "{}"}}"#,
        digest_of(&dir.path().join("scaler.json"))
    );
    fs::write(dir.path().join("digests.json"), manifest)?;
    let store = ArtifactStore::new(dir.path()).with_digest_manifest()?;
    assert!(store.digests().and_then(|d| d.scaler.as_ref()).is_some());
    assert!(store.verify()?);

    fs::write(dir.path().join("digests.json"), "not json")?;
    let err = ArtifactStore::new(dir.path()).with_digest_manifest().unwrap_err();
    assert!(matches!(err, PipelineError::DigestManifest { .. }));
    assert!(err.to_string().contains("digests.json"));
    assert!(!err.to_string().contains("classifier"));
    Ok(())
}
