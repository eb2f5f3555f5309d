// Emotion classification: classifier seam, label selection and ONNX backend

use crate::error::{EmotionPipelineError, Result};
use crate::models::{Classification, LabelSet};
use crate::preprocess::TensorBuffer;

/// Anything that turns a packed face tensor into one score per known label.
///
/// Implementations report an unusable model as `ModelUnavailable`.
pub trait Classifier {
    fn classify(&mut self, input: &TensorBuffer) -> Result<Vec<f32>>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&mut self, input: &TensorBuffer) -> Result<Vec<f32>> {
        (**self).classify(input)
    }
}

/// Picks the highest score; on ties the first index wins
pub fn select_label(scores: &[f32], labels: &LabelSet) -> Result<Classification> {
    if scores.is_empty() {
        return Err(EmotionPipelineError::InvalidInput(
            "score vector is empty".to_string(),
        ));
    }
    if let Some(idx) = scores.iter().position(|score| !score.is_finite()) {
        return Err(EmotionPipelineError::InvalidInput(format!(
            "score {idx} is not a finite number: {}",
            scores[idx]
        )));
    }
    if scores.len() != labels.len() {
        return Err(EmotionPipelineError::InvalidInput(format!(
            "got {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let mut best_idx = 0;
    let mut best_score = scores[0];
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > best_score {
            best_idx = idx;
            best_score = score;
        }
    }

    let label = labels.get(best_idx).ok_or_else(|| {
        EmotionPipelineError::InvalidInput(format!("no label for class index {best_idx}"))
    })?;
    Ok(Classification::new(label, best_score))
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::Classifier;
    use crate::error::{EmotionPipelineError, Result};
    use crate::preprocess::TensorBuffer;
    use ort::session::Session;
    use ort::value::Value;
    use std::path::Path;
    use tracing::{debug, error};

    /// Emotion classifier using ONNX Runtime
    ///
    /// The model takes a `[1, height, width, 3]` float tensor and returns one
    /// confidence per label in its first output.
    pub struct OnnxClassifier {
        session: Session,
    }

    impl OnnxClassifier {
        /// Loads the model once; `intra_threads` bounds inference parallelism
        pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self> {
            let session = Session::builder()
                .and_then(|builder| builder.with_intra_threads(intra_threads))
                .map_err(|e| {
                    EmotionPipelineError::ModelUnavailable(format!(
                        "Failed to create session builder: {e}"
                    ))
                })?
                .commit_from_file(model_path)
                .map_err(|e| {
                    error!("Failed to load ONNX model {:?}: {}", model_path, e);
                    EmotionPipelineError::ModelUnavailable(format!("ONNX model load failed: {e}"))
                })?;

            debug!(
                "Loaded emotion model {:?} with {} intra-op threads",
                model_path, intra_threads
            );
            Ok(Self { session })
        }
    }

    impl Classifier for OnnxClassifier {
        fn classify(&mut self, input: &TensorBuffer) -> Result<Vec<f32>> {
            let input_array = input.clone().into_array()?;

            let input_tensor = Value::from_array(input_array).map_err(|e| {
                EmotionPipelineError::ModelUnavailable(format!(
                    "Failed to create input tensor: {e}"
                ))
            })?;

            let outputs = self.session.run(ort::inputs![input_tensor]).map_err(|e| {
                error!("ONNX inference failed: {}", e);
                EmotionPipelineError::ModelUnavailable(format!("Inference failed: {e}"))
            })?;

            let (_, output_value) = outputs.iter().next().ok_or_else(|| {
                EmotionPipelineError::ModelUnavailable("No output from model".to_string())
            })?;

            let (_, scores) = output_value.try_extract_tensor::<f32>().map_err(|e| {
                EmotionPipelineError::ModelUnavailable(format!(
                    "Failed to extract output tensor: {e}"
                ))
            })?;

            Ok(scores.to_vec())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_model_is_unavailable() {
            let result = OnnxClassifier::new(Path::new("missing.onnx"), 1);
            assert!(matches!(
                result,
                Err(EmotionPipelineError::ModelUnavailable(_))
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionLabel;

    #[test]
    fn first_maximum_wins() {
        let labels = LabelSet::new(vec![
            EmotionLabel::Anger,
            EmotionLabel::Happy,
            EmotionLabel::Sad,
            EmotionLabel::Fear,
        ])
        .unwrap();
        let result = select_label(&[0.1, 0.9, 0.9, 0.2], &labels).unwrap();
        assert_eq!(result.label, EmotionLabel::Happy);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn confidence_is_not_renormalised() {
        let labels = LabelSet::new(vec![EmotionLabel::Neutral, EmotionLabel::Surprise]).unwrap();
        let result = select_label(&[3.5, 7.25], &labels).unwrap();
        assert_eq!(result, Classification::new(EmotionLabel::Surprise, 7.25));
    }

    #[test]
    fn negative_scores_still_pick_a_label() {
        let labels = LabelSet::new(vec![EmotionLabel::Anger, EmotionLabel::Sad]).unwrap();
        let result = select_label(&[-2.0, -1.0], &labels).unwrap();
        assert_eq!(result.label, EmotionLabel::Sad);
    }

    #[test]
    fn empty_scores_are_invalid() {
        let err = select_label(&[], &LabelSet::default()).unwrap_err();
        assert!(matches!(err, EmotionPipelineError::InvalidInput(_)));
    }

    #[test]
    fn non_finite_scores_are_invalid() {
        let labels = LabelSet::new(vec![EmotionLabel::Anger, EmotionLabel::Sad]).unwrap();
        for scores in [[f32::NAN, 0.5], [0.5, f32::NAN], [f32::INFINITY, 0.1]] {
            assert!(matches!(
                select_label(&scores, &labels),
                Err(EmotionPipelineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn length_mismatch_is_invalid() {
        let err = select_label(&[0.5, 0.5], &LabelSet::default()).unwrap_err();
        assert!(matches!(err, EmotionPipelineError::InvalidInput(_)));
    }
}
