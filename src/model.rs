//! Loading and running the ONNX classifier artifact

use crate::error::{PipelineError, Result};
use crate::interpret::Activation;
use crate::preprocess::ImageTensor;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing::info;

/// Raw scores from one forward pass, flattened over the unit batch dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub scores: Vec<f32>,
}

/// One long-lived inference session, loaded at startup and shared read-only
/// by every request. `ort` requires exclusive access per run, so the session
/// sits behind a mutex as the single acquisition point.
#[derive(Debug)]
pub struct ClassifierModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Declared input signature; non-positive extents are symbolic
    input_shape: Vec<i64>,
    /// Resolved from the declared output shape at load time when possible,
    /// otherwise from the arity of the first observed output
    activation: OnceLock<Activation>,
}

impl ClassifierModel {
    /// Load the artifact at `path`. Any failure here is fatal to startup;
    /// the service must not come up without a usable model.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::ModelLoad(format!(
                "model file '{}' not found",
                path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| Ok(b.with_optimization_level(GraphOptimizationLevel::Level3)?))
            .and_then(|mut b| Ok(b.commit_from_file(path)?))
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;

        // Exported artifacts disagree on the input identifier ("pixel_values",
        // "images", ...), so the binding name comes from the session itself
        let input = session
            .inputs()
            .first()
            .ok_or_else(|| PipelineError::ModelLoad("model declares no inputs".to_string()))?;
        let input_name = input.name().to_string();
        let input_shape = input
            .dtype()
            .tensor_shape()
            .map(|shape| shape.to_vec())
            .unwrap_or_default();

        let output = session
            .outputs()
            .first()
            .ok_or_else(|| PipelineError::ModelLoad("model declares no outputs".to_string()))?;
        let output_name = output.name().to_string();

        let activation = OnceLock::new();
        if let Some(resolved) = output
            .dtype()
            .tensor_shape()
            .and_then(|dims| dims.last().copied())
            .and_then(Activation::from_class_dim)
        {
            let _ = activation.set(resolved);
        }

        info!(
            model = %path.display(),
            input = %input_name,
            output = %output_name,
            activation = ?activation.get(),
            "ONNX model loaded"
        );

        Ok(ClassifierModel {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
            activation,
        })
    }

    /// Run one forward pass. Pure in its input tensor; no state outside the
    /// session is touched.
    pub fn infer(&self, tensor: &ImageTensor) -> Result<ModelOutput> {
        self.check_shape(tensor.shape())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Inference("session lock poisoned".to_string()))?;

        let input = TensorRef::from_array_view(tensor.array())
            .map_err(|e| PipelineError::Inference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        let (_, scores) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        Ok(ModelOutput {
            scores: scores.to_vec(),
        })
    }

    /// The activation convention for this artifact. Falls back to the arity
    /// of an observed output when the declared class dimension is symbolic;
    /// once resolved, the convention never changes.
    pub fn activation(&self, output_arity: usize) -> Result<Activation> {
        if let Some(resolved) = self.activation.get() {
            return Ok(*resolved);
        }
        let resolved = Activation::from_arity(output_arity)?;
        Ok(*self.activation.get_or_init(|| resolved))
    }

    fn check_shape(&self, actual: &[usize]) -> Result<()> {
        if shape_matches(&self.input_shape, actual) {
            Ok(())
        } else {
            Err(PipelineError::ShapeMismatch {
                expected: self.input_shape.clone(),
                actual: actual.iter().map(|&d| d as i64).collect(),
            })
        }
    }
}

/// Whether a concrete tensor shape satisfies a declared signature.
/// Non-positive declared extents are symbolic and match anything; an empty
/// signature (artifact without tensor type info) accepts any shape.
fn shape_matches(declared: &[i64], actual: &[usize]) -> bool {
    declared.is_empty()
        || (declared.len() == actual.len()
            && declared
                .iter()
                .zip(actual)
                .all(|(&want, &got)| want <= 0 || want as usize == got))
}
