// Core data models for the emotion announcer

use crate::error::{EmotionPipelineError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single captured frame together with the face regions detected in it
#[derive(Clone, Debug)]
pub struct Frame {
    /// RGB pixels of the whole frame
    pub image: RgbImage,
    /// Face bounding boxes supplied by the detector, in image coordinates
    pub faces: Vec<Region>,
}

impl Frame {
    /// Creates a new Frame from an image and its detected faces
    pub fn new(image: RgbImage, faces: Vec<Region>) -> Self {
        Self { image, faces }
    }

    /// Creates a Frame from raw RGB bytes (width * height * 3)
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32, faces: Vec<Region>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        let length_error = || {
            EmotionPipelineError::InvalidInput(format!(
                "expected {expected} bytes for a {width}x{height} RGB frame, got {actual}"
            ))
        };
        if actual != expected {
            return Err(length_error());
        }
        let image = RgbImage::from_raw(width, height, data).ok_or_else(length_error)?;
        Ok(Self::new(image, faces))
    }
}

/// Rectangular region in a parent image, right and bottom exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Region {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the region; zero or negative for degenerate regions
    pub fn width(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    /// Height of the region; zero or negative for degenerate regions
    pub fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }

    /// Returns true when the region is non-empty and lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width() > 0
            && self.height() > 0
            && self.left >= 0
            && self.top >= 0
            && self.right as i64 <= width as i64
            && self.bottom as i64 <= height as i64
    }
}

/// Emotion classes known to the classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Anger,
    Contempt,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl EmotionLabel {
    /// All labels in the order the bundled model emits them
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Anger,
        EmotionLabel::Contempt,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Anger => "anger",
            EmotionLabel::Contempt => "contempt",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = EmotionPipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| EmotionPipelineError::InvalidInput(format!("unknown emotion label '{s}'")))
    }
}

/// Ordered label list; index `i` names the class of score `i`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<EmotionLabel>,
}

impl LabelSet {
    /// Creates a label set, rejecting empty lists and duplicates
    pub fn new(labels: Vec<EmotionLabel>) -> Result<Self> {
        if labels.is_empty() {
            return Err(EmotionPipelineError::InvalidInput(
                "label set must not be empty".to_string(),
            ));
        }
        for (idx, label) in labels.iter().enumerate() {
            if labels[..idx].contains(label) {
                return Err(EmotionPipelineError::InvalidInput(format!(
                    "label '{label}' appears more than once"
                )));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<EmotionLabel> {
        self.labels.get(index).copied()
    }

    pub fn as_slice(&self) -> &[EmotionLabel] {
        &self.labels
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: EmotionLabel::ALL.to_vec(),
        }
    }
}

/// Winning label of one face and its raw score
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub label: EmotionLabel,
    /// Raw classifier score, not renormalised
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: EmotionLabel, confidence: f32) -> Self {
        Self { label, confidence }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} %{}", self.label, self.confidence * 100.0)
    }
}

/// Result of running one face through the classifier
#[derive(Clone, Debug, PartialEq)]
pub enum FaceOutcome {
    Classified(Classification),
    /// Classified, but below the configured confidence floor; not counted in the vote
    LowConfidence(Classification),
    Failed { reason: String },
}

impl FaceOutcome {
    /// The label that takes part in the majority vote, if any
    pub fn voting_label(&self) -> Option<EmotionLabel> {
        match self {
            FaceOutcome::Classified(c) => Some(c.label),
            FaceOutcome::LowConfidence(_) | FaceOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FaceOutcome::Failed { .. })
    }
}

impl std::fmt::Display for FaceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceOutcome::Classified(c) => write!(f, "{c}"),
            FaceOutcome::LowConfidence(c) => write!(f, "{c} (low confidence)"),
            FaceOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Everything the pipeline learned from one frame
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// Per-face outcomes, in detector order
    pub faces: Vec<FaceOutcome>,
    /// Majority label over the faces that voted
    pub majority: EmotionLabel,
    /// Last resized face crop, kept for display
    pub preview: Option<RgbImage>,
}

impl FrameReport {
    /// True when at least one face could not be classified
    pub fn is_degraded(&self) -> bool {
        self.faces.iter().any(FaceOutcome::is_failure)
    }

    /// Labels of the faces that were classified, including low-confidence ones
    pub fn labels(&self) -> Vec<EmotionLabel> {
        self.faces
            .iter()
            .filter_map(|face| match face {
                FaceOutcome::Classified(c) | FaceOutcome::LowConfidence(c) => Some(c.label),
                FaceOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Summary text in the form `Faces: <n>` followed by the label list
    pub fn summary(&self) -> String {
        let labels: Vec<&str> = self
            .faces
            .iter()
            .map(|face| match face {
                FaceOutcome::Classified(c) | FaceOutcome::LowConfidence(c) => c.label.as_str(),
                FaceOutcome::Failed { .. } => "?",
            })
            .collect();
        format!("Faces: {}\n[{}]", self.faces.len(), labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_bounds() {
        let region = Region::new(2, 3, 10, 8);
        assert_eq!(region.width(), 8);
        assert_eq!(region.height(), 5);
        assert!(region.fits_within(10, 8));
        assert!(!region.fits_within(9, 8));
        assert!(!Region::new(-1, 0, 4, 4).fits_within(10, 10));
        assert!(!Region::new(4, 0, 4, 4).fits_within(10, 10));
    }

    #[test]
    fn label_parsing_is_case_insensitive() {
        assert_eq!("Happy".parse::<EmotionLabel>().unwrap(), EmotionLabel::Happy);
        assert_eq!(" surprise ".parse::<EmotionLabel>().unwrap(), EmotionLabel::Surprise);
        assert!("bored".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn label_set_rejects_duplicates_and_empty() {
        assert!(LabelSet::new(vec![]).is_err());
        assert!(LabelSet::new(vec![EmotionLabel::Sad, EmotionLabel::Sad]).is_err());
        let set = LabelSet::default();
        assert_eq!(set.len(), 8);
        assert_eq!(set.get(4), Some(EmotionLabel::Happy));
    }

    #[test]
    fn frame_from_rgb_checks_length() {
        assert!(Frame::from_rgb(vec![0; 12], 2, 2, vec![]).is_ok());
        assert!(Frame::from_rgb(vec![0; 11], 2, 2, vec![]).is_err());
        assert!(matches!(
            Frame::from_rgb(vec![0; 13], 2, 2, vec![]),
            Err(EmotionPipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn report_summary_lists_labels() {
        let report = FrameReport {
            faces: vec![
                FaceOutcome::Classified(Classification::new(EmotionLabel::Happy, 0.9)),
                FaceOutcome::Failed {
                    reason: "no model".to_string(),
                },
                FaceOutcome::LowConfidence(Classification::new(EmotionLabel::Sad, 0.1)),
            ],
            majority: EmotionLabel::Happy,
            preview: None,
        };
        assert_eq!(report.summary(), "Faces: 3\n[happy, ?, sad]");
        assert!(report.is_degraded());
        assert_eq!(report.labels(), vec![EmotionLabel::Happy, EmotionLabel::Sad]);
    }

    #[test]
    fn classification_display_uses_percent() {
        let c = Classification::new(EmotionLabel::Fear, 0.5);
        assert_eq!(c.to_string(), "fear %50");
    }
}
