use std::fmt;

/// The three serialized objects a recommender is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Scaler,
    Encoder,
    Classifier,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Scaler, ArtifactKind::Encoder, ArtifactKind::Classifier];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scaler => write!(f, "scaler"),
            Self::Encoder => write!(f, "label encoder"),
            Self::Classifier => write!(f, "classifier"),
        }
    }
}

/// Represents the different types of errors that can occur while loading artifacts
/// or producing a recommendation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An artifact is missing, unreadable, corrupted or written in an unsupported format version
    #[error("Failed to load {artifact} artifact from {path}: {reason}")]
    ArtifactLoad {
        artifact: ArtifactKind,
        path: String,
        reason: String,
    },
    /// The digest manifest next to the artifacts is unreadable or malformed
    #[error("Invalid digest manifest {path}: {reason}")]
    DigestManifest { path: String, reason: String },
    /// The input does not have the cardinality or field order the scaler was fitted with
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// The classifier could not run on the given input
    #[error("Inference error: {0}")]
    Inference(String),
    /// The classifier produced an index the label encoder does not know
    #[error("Unknown class index {index} (label encoder knows {num_classes} classes)")]
    UnknownClass { index: usize, num_classes: usize },
    /// A label that is not part of the encoder's table
    #[error("Unknown crop label: {0}")]
    UnknownLabel(String),
}

impl PipelineError {
    pub(crate) fn artifact_load(
        artifact: ArtifactKind,
        path: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArtifactLoad {
            artifact,
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
