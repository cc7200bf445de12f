//! Error types for the classification pipeline

use thiserror::Error;

/// Every failure the pipeline or result store can produce. Decode and shape
/// errors are request-scoped; `ModelLoad` is fatal and only occurs at startup.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded bytes could not be decoded as an image
    #[error("could not decode image: {0}")]
    Decode(String),

    /// The input tensor disagrees with the model's declared input signature
    #[error("input shape {actual:?} does not match model signature {expected:?}")]
    ShapeMismatch {
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    /// The model produced an output arity the interpreter cannot handle
    #[error("model produced {0} class scores, expected 1 (sigmoid) or 2+ (softmax)")]
    InvalidOutputShape(usize),

    /// No stored result under the requested id
    #[error("result '{0}' not found")]
    NotFound(String),

    /// The model artifact is missing or unloadable
    #[error("could not load model: {0}")]
    ModelLoad(String),

    /// The ONNX runtime failed during a forward pass
    #[error("inference failed: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
