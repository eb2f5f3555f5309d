// Per-frame reduction from face regions to a single majority label

use crate::aggregate::majority;
use crate::config::AnalyzerConfig;
use crate::emotion::{select_label, Classifier};
use crate::error::{EmotionPipelineError, Result};
use crate::models::{
    Classification, EmotionLabel, FaceOutcome, Frame, FrameReport, LabelSet, Region,
};
use crate::preprocess::{resize, ResizeFilter, TensorPacker};
use crate::region::extract;
use image::RgbImage;
use tracing::{debug, warn};

/// Crops, resizes, packs and classifies every face of a frame, then votes.
///
/// One frame is processed at a time; the pipeline keeps no state between frames.
pub struct EmotionPipeline<C> {
    classifier: C,
    labels: LabelSet,
    packer: TensorPacker,
    filter: ResizeFilter,
    min_confidence: f32,
}

impl<C: Classifier> EmotionPipeline<C> {
    pub fn new(
        classifier: C,
        labels: LabelSet,
        packer: TensorPacker,
        filter: ResizeFilter,
    ) -> Self {
        Self {
            classifier,
            labels,
            packer,
            filter,
            min_confidence: 0.0,
        }
    }

    /// Builds a pipeline from validated settings
    pub fn from_config(classifier: C, config: &AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            classifier,
            config.label_set()?,
            config.packer(),
            config.resize_filter,
        )
        .with_min_confidence(config.min_confidence))
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Crop, resize and classify one face
    pub fn classify_face(
        &mut self,
        image: &RgbImage,
        region: Region,
    ) -> Result<(Classification, RgbImage)> {
        let crop = extract(image, region)?;
        let shape = self.packer.shape();
        let resized = resize(&crop, shape.width, shape.height, self.filter);
        let tensor = self.packer.pack(&resized)?;
        let scores = self.classifier.classify(&tensor)?;
        let classification = select_label(&scores, &self.labels)?;
        Ok((classification, resized))
    }

    /// Runs every face of `frame` through the classifier and reduces the labels.
    ///
    /// Faces that fail are reported in the result and left out of the vote.
    /// Fails with `EmptyInput` when the frame has no faces or none of them
    /// voted, and with the first classifier error when every face failed.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        if frame.faces.is_empty() {
            return Err(EmotionPipelineError::EmptyInput);
        }

        let mut faces = Vec::with_capacity(frame.faces.len());
        let mut votes: Vec<EmotionLabel> = Vec::with_capacity(frame.faces.len());
        let mut preview = None;
        let mut first_error = None;

        for (idx, region) in frame.faces.iter().enumerate() {
            match self.classify_face(&frame.image, *region) {
                Ok((classification, resized)) => {
                    debug!("Face {} at {:?}: {}", idx, region, classification);
                    preview = Some(resized);
                    if classification.confidence < self.min_confidence {
                        faces.push(FaceOutcome::LowConfidence(classification));
                    } else {
                        votes.push(classification.label);
                        faces.push(FaceOutcome::Classified(classification));
                    }
                }
                Err(e) => {
                    warn!("Face {} at {:?} could not be classified: {}", idx, region, e);
                    faces.push(FaceOutcome::Failed {
                        reason: e.to_string(),
                    });
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if faces.iter().all(FaceOutcome::is_failure) {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let majority = majority(&votes)?;
        Ok(FrameReport {
            faces,
            majority,
            preview,
        })
    }
}
