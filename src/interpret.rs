//! Turning raw model scores into labeled predictions

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Class labels, index-aligned with the model's output vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Benign,
    Malignant,
}

impl Label {
    fn from_index(index: usize, arity: usize) -> Result<Label> {
        match index {
            0 => Ok(Label::Benign),
            1 => Ok(Label::Malignant),
            _ => Err(PipelineError::InvalidOutputShape(arity)),
        }
    }
}

/// Which transform converts the model's raw output into probabilities.
/// Resolved once from the artifact's declared output shape rather than
/// re-detected on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Two or more class logits: softmax + argmax
    Softmax,
    /// A single raw score: logistic transform + 0.5 threshold
    Sigmoid,
}

impl Activation {
    /// Resolve from a declared class-dimension extent. Symbolic (non-positive)
    /// extents yield `None`; the caller falls back to [`Activation::from_arity`]
    /// on the first observed output.
    pub fn from_class_dim(extent: i64) -> Option<Activation> {
        match extent {
            1 => Some(Activation::Sigmoid),
            n if n >= 2 => Some(Activation::Softmax),
            _ => None,
        }
    }

    /// Resolve from the arity of an actual model output
    pub fn from_arity(arity: usize) -> Result<Activation> {
        match arity {
            0 => Err(PipelineError::InvalidOutputShape(0)),
            1 => Ok(Activation::Sigmoid),
            _ => Ok(Activation::Softmax),
        }
    }
}

/// A labeled prediction with the probability of the predicted class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence: f32,
}

/// Interpret one raw output vector. Confidence is always the probability
/// mass assigned to the winning class, never a raw logit.
pub fn interpret(activation: Activation, scores: &[f32]) -> Result<PredictionResult> {
    match activation {
        Activation::Softmax => {
            if scores.len() < 2 {
                return Err(PipelineError::InvalidOutputShape(scores.len()));
            }
            let probabilities = softmax(scores);
            let (index, confidence) = argmax(&probabilities);
            Ok(PredictionResult {
                label: Label::from_index(index, scores.len())?,
                confidence,
            })
        }
        Activation::Sigmoid => {
            if scores.len() != 1 {
                return Err(PipelineError::InvalidOutputShape(scores.len()));
            }
            let value = sigmoid(scores[0]);
            // Malignant only strictly above the threshold, so 0.5 resolves
            // deterministically to Benign
            if value > 0.5 {
                Ok(PredictionResult {
                    label: Label::Malignant,
                    confidence: value,
                })
            } else {
                Ok(PredictionResult {
                    label: Label::Benign,
                    confidence: 1.0 - value,
                })
            }
        }
    }
}

/// Max-subtracted softmax; the shift keeps `exp` from overflowing on large
/// logits without changing the distribution
fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(score: f32) -> f32 {
    1.0 / (1.0 + (-score).exp())
}

fn argmax(probabilities: &[f32]) -> (usize, f32) {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
            if p > best.1 {
                (i, p)
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_picks_class_zero() {
        let result = interpret(Activation::Softmax, &[2.0, 1.0]).unwrap();
        assert_eq!(result.label, Label::Benign);
        assert!((result.confidence - 0.731).abs() < 1e-3);
    }

    #[test]
    fn softmax_picks_class_one() {
        let result = interpret(Activation::Softmax, &[1.0, 2.0]).unwrap();
        assert_eq!(result.label, Label::Malignant);
        assert!((result.confidence - 0.731).abs() < 1e-3);
    }

    #[test]
    fn softmax_survives_huge_logits() {
        let result = interpret(Activation::Softmax, &[1000.0, 999.0]).unwrap();
        assert_eq!(result.label, Label::Benign);
        assert!(result.confidence.is_finite());
        assert!(result.confidence > 0.5 && result.confidence <= 1.0);
    }

    #[test]
    fn sigmoid_boundary_is_benign() {
        let result = interpret(Activation::Sigmoid, &[0.0]).unwrap();
        assert_eq!(result.label, Label::Benign);
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_large_score_is_malignant() {
        let result = interpret(Activation::Sigmoid, &[10.0]).unwrap();
        assert_eq!(result.label, Label::Malignant);
        assert!((result.confidence - 0.99995).abs() < 1e-4);
    }

    #[test]
    fn sigmoid_confidence_tracks_predicted_class() {
        // A negative score predicts Benign; confidence must be the Benign
        // probability, not the raw sigmoid value
        let result = interpret(Activation::Sigmoid, &[-2.0]).unwrap();
        assert_eq!(result.label, Label::Benign);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(matches!(
            interpret(Activation::Softmax, &[]),
            Err(PipelineError::InvalidOutputShape(0))
        ));
    }

    #[test]
    fn sigmoid_rejects_vector_output() {
        assert!(matches!(
            interpret(Activation::Sigmoid, &[0.1, 0.9]),
            Err(PipelineError::InvalidOutputShape(2))
        ));
    }

    #[test]
    fn interpretation_is_deterministic() {
        let a = interpret(Activation::Softmax, &[0.3, 0.7]).unwrap();
        let b = interpret(Activation::Softmax, &[0.3, 0.7]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn activation_resolution_from_declared_shape() {
        assert_eq!(Activation::from_class_dim(1), Some(Activation::Sigmoid));
        assert_eq!(Activation::from_class_dim(2), Some(Activation::Softmax));
        assert_eq!(Activation::from_class_dim(-1), None);
    }
}
