mod common;

use common::{fixture_recommender, fixture_store, FIXTURE_LABELS};
use crop_advisor::{recommend, ClassIndex, Feature, FeatureVector, ModelContext, PipelineError};

#[test]
fn test_concrete_scenario() -> Result<(), PipelineError> {
    let recommender = fixture_recommender();
    let crop = recommender.recommend(&FeatureVector::new(90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9))?;
    assert_eq!(crop, "rice");
    assert!(!crop.as_str().is_empty());
    assert_eq!(crop.display_name(), "RICE");
    Ok(())
}

#[test]
fn test_lower_boundary() -> Result<(), PipelineError> {
    let recommender = fixture_recommender();
    let crop = recommender.recommend_readings(0.0, 0.0, 0.0, -10.0, 0.0, 0.0, 0.0)?;
    assert!(FIXTURE_LABELS.contains(&crop.as_str()));
    assert_eq!(crop, "chickpea");
    Ok(())
}

#[test]
fn test_upper_boundary() -> Result<(), PipelineError> {
    let recommender = fixture_recommender();
    let crop = recommender.recommend_readings(100.0, 100.0, 100.0, 50.0, 100.0, 14.0, 500.0)?;
    assert!(FIXTURE_LABELS.contains(&crop.as_str()));
    assert_eq!(crop, "rice");
    Ok(())
}

#[test]
fn test_form_defaults() -> Result<(), PipelineError> {
    let recommender = fixture_recommender();
    assert_eq!(recommender.recommend(&FeatureVector::default())?, "maize");
    Ok(())
}

#[test]
fn test_every_grid_point_yields_a_known_label() -> Result<(), PipelineError> {
    let recommender = fixture_recommender();
    let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
    let mut seen = std::collections::HashSet::new();

    // Sweep each feature across its range while the others stay at their defaults
    for feature in Feature::ALL {
        let range = feature.range();
        for step in steps {
            let mut readings = FeatureVector::default();
            readings.set(feature, range.start() + step * (range.end() - range.start()));
            let crop = recommender.recommend(&readings)?;
            assert!(
                recommender.labels().iter().any(|label| label == crop.as_str()),
                "{crop} is not a known label"
            );
            seen.insert(crop.into_string());
        }
    }
    assert_eq!(seen.len(), FIXTURE_LABELS.len());
    Ok(())
}

#[test]
fn test_deterministic() -> Result<(), PipelineError> {
    let readings = FeatureVector::new(40.0, 60.0, 80.0, 18.0, 16.0, 7.2, 80.0);
    let first = fixture_recommender().recommend(&readings)?;
    let second = fixture_recommender().recommend(&readings)?;
    assert_eq!(first, second);
    assert_eq!(first, "chickpea");
    Ok(())
}

#[test]
fn test_recommend_function() -> Result<(), PipelineError> {
    let context = ModelContext::new(fixture_store());
    assert!(!context.is_loaded());
    let crop = recommend(&context, 80.0, 40.0, 20.0, 23.0, 82.0, 6.0, 80.0)?;
    assert_eq!(crop, "maize");
    assert!(context.is_loaded());
    Ok(())
}

#[test]
fn test_encoder_round_trip_on_fixture() -> Result<(), PipelineError> {
    let encoder = fixture_store().load_encoder()?;
    for label in encoder.classes() {
        assert_eq!(encoder.decode(encoder.encode(label)?)?.as_str(), label);
    }
    for i in 0..encoder.len() {
        assert_eq!(encoder.encode(encoder.decode(ClassIndex(i))?.as_str())?, ClassIndex(i));
    }
    Ok(())
}

#[test]
fn test_info_describes_fixture() {
    let info = fixture_recommender().info();
    assert_eq!(info.class_labels, FIXTURE_LABELS);
    assert_eq!(info.num_classes, 3);
    assert_eq!(info.feature_names, ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"]);
    assert_eq!(info.backend, "gradient-boosting");
    assert_eq!(info.num_stages, Some(2));
    assert!(info.source.ends_with("fixtures"));
}
