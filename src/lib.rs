// Library exports for the emotion announcer

pub mod aggregate;
pub mod analyzer;
pub mod announce;
pub mod config;
pub mod emotion;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod region;
pub mod replay;

pub use aggregate::majority;
pub use analyzer::{latest_frame_channel, Analysis, DisplayUpdate, FrameAnalyzer, LatestFrameSender};
pub use announce::{Announcement, Announcer, LogSpeaker, PhraseBook, Speaker};
pub use config::AnalyzerConfig;
pub use emotion::{select_label, Classifier};
pub use error::{EmotionPipelineError, Result};
pub use models::{Classification, EmotionLabel, FaceOutcome, Frame, FrameReport, LabelSet, Region};
pub use pipeline::EmotionPipeline;
pub use preprocess::{resize, ResizeFilter, TensorBuffer, TensorPacker, TensorShape};
pub use region::extract;
