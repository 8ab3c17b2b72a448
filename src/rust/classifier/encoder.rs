use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ArtifactKind, PipelineError};
use crate::artifacts::{self, ArtifactDocument, ARTIFACT_FORMAT_VERSION};

/// Index of a crop class, meaningful only relative to a [`LabelEncoder`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassIndex(pub usize);

impl fmt::Display for ClassIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Crop name as stored in the label encoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CropLabel(String);

impl CropLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased form used on the result card
    pub fn display_name(&self) -> String {
        self.0.to_uppercase()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CropLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CropLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for CropLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Fixed table mapping crop names to class indices, as established at training time.
///
/// Position in `classes` is the class index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    version: u32,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// # Example
    /// ```
    /// use crop_advisor::{ClassIndex, LabelEncoder};
    ///
    /// let encoder = LabelEncoder::new(vec!["chickpea", "maize", "rice"]).unwrap();
    /// assert_eq!(encoder.decode(ClassIndex(2)).unwrap(), "rice");
    /// assert_eq!(encoder.encode("maize").unwrap(), ClassIndex(1));
    /// ```
    pub fn new(classes: Vec<impl Into<String>>) -> Result<Self, PipelineError> {
        let encoder = Self {
            version: ARTIFACT_FORMAT_VERSION,
            classes: classes.into_iter().map(Into::into).collect(),
        };
        encoder
            .validate()
            .map_err(|reason| PipelineError::artifact_load(ArtifactKind::Encoder, "<in-memory>", reason))?;
        Ok(encoder)
    }

    /// Parses an encoder artifact from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        artifacts::parse_document(json.as_bytes(), "<inline>")
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.iter().any(|class| class == label)
    }

    pub fn encode(&self, label: &str) -> Result<ClassIndex, PipelineError> {
        self.classes
            .iter()
            .position(|class| class == label)
            .map(ClassIndex)
            .ok_or_else(|| PipelineError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, index: ClassIndex) -> Result<CropLabel, PipelineError> {
        self.classes
            .get(index.0)
            .map(|label| CropLabel(label.clone()))
            .ok_or(PipelineError::UnknownClass {
                index: index.0,
                num_classes: self.classes.len(),
            })
    }
}

impl ArtifactDocument for LabelEncoder {
    const KIND: ArtifactKind = ArtifactKind::Encoder;

    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("class table is empty".into());
        }
        if let Some(pos) = self.classes.iter().position(|c| c.is_empty()) {
            return Err(format!("class {} has an empty label", pos));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("duplicate class label '{}'", dup));
        }
        Ok(())
    }
}
