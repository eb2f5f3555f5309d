// Analyzer configuration read from JSON; every field has a default, so an empty object is valid

use crate::announce::PhraseBook;
use crate::error::{EmotionPipelineError, Result};
use crate::models::{EmotionLabel, LabelSet};
use crate::preprocess::{ResizeFilter, TensorPacker, TensorShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Classifier model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path to the ONNX emotion model
    pub path: PathBuf,
    /// Inference threads
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/models/emotion.onnx"),
            intra_threads: 4,
        }
    }
}

/// Top-level settings for the frame analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Model input width and height in pixels
    pub input_size: u32,
    /// Multiplier applied to raw [0, 255] channel values
    pub pixel_scale: f32,
    pub resize_filter: ResizeFilter,
    /// Class order of the classifier's score vector
    pub labels: Vec<EmotionLabel>,
    /// Minimum delay between two analysed frames
    pub analysis_interval_ms: u64,
    /// Faces scoring below this are reported but do not vote
    pub min_confidence: f32,
    pub model: ModelSettings,
    /// Spoken phrase per label; missing labels are spoken by name
    pub phrases: BTreeMap<EmotionLabel, String>,
    /// How long the log speaker stays busy after an utterance
    pub utterance_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            input_size: 224,
            pixel_scale: 1.0,
            resize_filter: ResizeFilter::Nearest,
            labels: EmotionLabel::ALL.to_vec(),
            analysis_interval_ms: 5_000,
            min_confidence: 0.0,
            model: ModelSettings::default(),
            phrases: PhraseBook::turkish()
                .entries()
                .map(|(label, phrase)| (label, phrase.to_string()))
                .collect(),
            utterance_ms: 1_500,
        }
    }
}

impl AnalyzerConfig {
    /// Loads and validates a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: AnalyzerConfig = serde_json::from_str(&contents).map_err(|e| {
            EmotionPipelineError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(EmotionPipelineError::Config(
                "input_size must be greater than zero".to_string(),
            ));
        }
        if !self.pixel_scale.is_finite() || self.pixel_scale <= 0.0 {
            return Err(EmotionPipelineError::Config(format!(
                "pixel_scale must be a positive number, got {}",
                self.pixel_scale
            )));
        }
        if self.model.intra_threads == 0 {
            return Err(EmotionPipelineError::Config(
                "model.intra_threads must be at least 1".to_string(),
            ));
        }
        self.label_set()
            .map_err(|e| EmotionPipelineError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn label_set(&self) -> Result<LabelSet> {
        LabelSet::new(self.labels.clone())
    }

    pub fn tensor_shape(&self) -> TensorShape {
        TensorShape::square(self.input_size)
    }

    pub fn packer(&self) -> TensorPacker {
        TensorPacker::new(self.tensor_shape(), self.pixel_scale)
    }

    pub fn phrase_book(&self) -> PhraseBook {
        PhraseBook::new(self.phrases.clone())
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_millis(self.analysis_interval_ms)
    }

    pub fn utterance(&self) -> Duration {
        Duration::from_millis(self.utterance_ms)
    }
}
