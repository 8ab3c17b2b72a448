use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::{ArtifactKind, PipelineError};
use crate::artifacts::{self, ArtifactDocument, ARTIFACT_FORMAT_VERSION};
use crate::features::{Feature, FeatureVector};

/// Pre-fitted standardization transform: `z = (x - mean) / scale`.
///
/// Parameters are fixed when the artifact is loaded; `transform` never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, PipelineError> {
        let scaler = Self {
            version: ARTIFACT_FORMAT_VERSION,
            feature_names: None,
            mean,
            scale,
        };
        scaler
            .validate()
            .map_err(|reason| PipelineError::artifact_load(ArtifactKind::Scaler, "<in-memory>", reason))?;
        Ok(scaler)
    }

    /// Records the column names the scaler was fitted on. `transform` then
    /// rejects inputs whose field order differs.
    pub fn with_feature_names(mut self, names: Vec<impl Into<String>>) -> Self {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parses a scaler artifact from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        artifacts::parse_document(json.as_bytes(), "<inline>")
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Scales a full set of readings.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the scaler was not fitted on exactly seven features
    /// - `ShapeMismatch` if the stored column names differ from the canonical order
    pub fn transform(&self, features: &FeatureVector) -> Result<Array1<f64>, PipelineError> {
        if let Some(names) = &self.feature_names {
            let expected: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
            if names.iter().map(String::as_str).ne(expected.iter().copied()) {
                return Err(PipelineError::ShapeMismatch(format!(
                    "scaler was fitted on columns [{}], input columns are [{}]",
                    names.join(", "),
                    expected.join(", ")
                )));
            }
        }
        self.transform_slice(&features.values())
    }

    /// Scales raw values given in fitted order.
    pub fn transform_slice(&self, values: &[f64]) -> Result<Array1<f64>, PipelineError> {
        if values.len() != self.n_features() {
            return Err(PipelineError::ShapeMismatch(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                values.len()
            )));
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect())
    }
}

impl ArtifactDocument for StandardScaler {
    const KIND: ArtifactKind = ArtifactKind::Scaler;

    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no features".into());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(format!(
                    "{} feature names for {} features",
                    names.len(),
                    self.mean.len()
                ));
            }
        }
        if let Some(pos) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean of feature {} is not finite", pos));
        }
        if let Some(pos) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(format!("scale of feature {} must be finite and non-zero", pos));
        }
        Ok(())
    }
}
