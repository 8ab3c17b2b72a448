use std::collections::HashMap;

use log::info;
use ndarray::{Array2, ArrayView1};
use ort::session::Session;
use ort::value::Tensor;

use super::encoder::ClassIndex;
use super::error::{ArtifactKind, PipelineError};
use super::ClassModel;
use crate::runtime::{create_session_builder, ensure_initialized, RuntimeConfig};

/// Classifier backed by a converted ONNX model.
///
/// The model must take one `float` input of shape `[batch, n_features]` and
/// return the predicted class index as its first `int64` output.
#[derive(Debug)]
pub struct OnnxClassifier {
    model_path: String,
    input_name: String,
    session: Session,
    n_features: usize,
    n_classes: usize,
}

impl OnnxClassifier {
    pub fn from_file(
        model_path: &str,
        n_features: usize,
        n_classes: usize,
        config: &RuntimeConfig,
    ) -> Result<Self, PipelineError> {
        let load_error = |reason: String| PipelineError::artifact_load(ArtifactKind::Classifier, model_path, reason);

        if model_path.is_empty() {
            return Err(load_error("model path cannot be empty".into()));
        }
        if !std::path::Path::new(model_path).exists() {
            return Err(load_error("model file not found".into()));
        }

        ensure_initialized().map_err(|e| load_error(format!("ONNX Runtime failed to initialize: {}", e)))?;
        let session = create_session_builder(config)
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| load_error(e.to_string()))?;

        Self::validate_model(&session).map_err(load_error)?;
        info!("ONNX model structure validated successfully");

        let input_name = session.inputs[0].name.clone();
        Ok(Self {
            model_path: model_path.to_string(),
            input_name,
            session,
            n_features,
            n_classes,
        })
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    fn validate_model(session: &Session) -> Result<(), String> {
        if session.inputs.len() != 1 {
            return Err(format!("model must have exactly 1 input, found {}", session.inputs.len()));
        }
        if session.outputs.is_empty() {
            return Err("model must have at least 1 output for the predicted label".to_string());
        }
        Ok(())
    }
}

impl ClassModel for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> Result<ClassIndex, PipelineError> {
        if x.len() != self.n_features {
            return Err(PipelineError::Inference(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                x.len()
            )));
        }

        let input_array = Array2::from_shape_vec((1, x.len()), x.iter().map(|&v| v as f32).collect())
            .map_err(|e| PipelineError::Inference(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| PipelineError::Inference(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PipelineError::Inference(format!("Failed to run model: {}", e)))?;
        let labels = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| PipelineError::Inference(format!("Failed to extract label tensor: {}", e)))?;

        let label = labels
            .iter()
            .next()
            .copied()
            .ok_or_else(|| PipelineError::Inference("model returned no label".into()))?;
        usize::try_from(label)
            .map(ClassIndex)
            .map_err(|_| PipelineError::Inference(format!("model returned negative label {}", label)))
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}
