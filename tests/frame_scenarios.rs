use emotion_announcer::analyzer::FrameAnalyzer;
use emotion_announcer::announce::{Announcement, Announcer, PhraseBook, Speaker};
use emotion_announcer::config::AnalyzerConfig;
use emotion_announcer::emotion::Classifier;
use emotion_announcer::error::{EmotionPipelineError, Result};
use emotion_announcer::models::{EmotionLabel, FaceOutcome, Frame, Region};
use emotion_announcer::pipeline::EmotionPipeline;
use emotion_announcer::preprocess::TensorBuffer;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Hands out canned classifier responses in order
struct Scripted {
    responses: VecDeque<Result<EmotionLabel>>,
}

impl Scripted {
    fn new(responses: Vec<Result<EmotionLabel>>) -> Self {
        Self {
            responses: responses.into(),
        }
    }
}

impl Classifier for Scripted {
    fn classify(&mut self, input: &TensorBuffer) -> Result<Vec<f32>> {
        assert_eq!(input.len(), 224 * 224 * 3);
        let label = self
            .responses
            .pop_front()
            .unwrap_or(Err(EmotionPipelineError::ModelUnavailable(
                "script exhausted".to_string(),
            )))?;
        Ok(EmotionLabel::ALL
            .iter()
            .map(|candidate| if *candidate == label { 0.7 } else { 0.3 / 7.0 })
            .collect())
    }
}

/// Stays busy after the first utterance until released
#[derive(Default)]
struct SlowSpeaker {
    spoken: Vec<String>,
    speaking: bool,
}

impl Speaker for SlowSpeaker {
    fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.push(text.to_string());
        self.speaking = true;
        Ok(())
    }
}

fn crowd_frame() -> Frame {
    let image = RgbImage::from_fn(640, 480, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    Frame::new(
        image,
        vec![
            Region::new(10, 10, 110, 130),
            Region::new(200, 40, 260, 100),
            Region::new(400, 300, 630, 470),
        ],
    )
}

fn pipeline(classifier: Scripted) -> EmotionPipeline<Scripted> {
    EmotionPipeline::from_config(classifier, &AnalyzerConfig::default()).unwrap()
}

#[test]
fn three_faces_announce_happy_once() {
    let classifier = Scripted::new(vec![
        Ok(EmotionLabel::Happy),
        Ok(EmotionLabel::Sad),
        Ok(EmotionLabel::Happy),
        Ok(EmotionLabel::Happy),
        Ok(EmotionLabel::Sad),
        Ok(EmotionLabel::Happy),
    ]);
    let (display, _rx) = broadcast::channel(4);
    let mut analyzer = FrameAnalyzer::new(
        pipeline(classifier),
        Announcer::new(PhraseBook::turkish(), SlowSpeaker::default()),
        display,
    );

    let frame = crowd_frame();
    let first = analyzer.analyze(&frame).unwrap();
    assert_eq!(first.report.majority, EmotionLabel::Happy);
    assert_eq!(first.announcement, Announcement::Spoken("mutlu".to_string()));

    let second = analyzer.analyze(&frame).unwrap();
    assert_eq!(second.report.majority, EmotionLabel::Happy);
    assert_eq!(second.announcement, Announcement::Suppressed);

    assert_eq!(analyzer.announcer().speaker().spoken, vec!["mutlu"]);
    let stats = analyzer.stats();
    assert_eq!(stats.announced, 1);
    assert_eq!(stats.suppressed, 1);
}

#[test]
fn every_face_is_packed_at_model_size() {
    let mut pipeline = pipeline(Scripted::new(vec![
        Ok(EmotionLabel::Fear),
        Ok(EmotionLabel::Fear),
        Ok(EmotionLabel::Anger),
    ]));
    let report = pipeline.process_frame(&crowd_frame()).unwrap();
    assert_eq!(report.majority, EmotionLabel::Fear);
    assert_eq!(report.preview.unwrap().dimensions(), (224, 224));
}

#[test]
fn classifier_failure_on_every_face_surfaces_model_unavailable() {
    let mut pipeline = pipeline(Scripted::new(vec![]));
    let err = pipeline.process_frame(&crowd_frame()).unwrap_err();
    assert!(matches!(err, EmotionPipelineError::ModelUnavailable(_)));
}

#[test]
fn partial_classifier_failure_degrades_without_miscounting() {
    let mut pipeline = pipeline(Scripted::new(vec![
        Ok(EmotionLabel::Sad),
        Err(EmotionPipelineError::ModelUnavailable("gpu lost".to_string())),
        Ok(EmotionLabel::Neutral),
    ]));
    let report = pipeline.process_frame(&crowd_frame()).unwrap();
    assert!(report.is_degraded());
    assert!(matches!(report.faces[1], FaceOutcome::Failed { .. }));
    // sad and neutral tie; sad was seen first
    assert_eq!(report.majority, EmotionLabel::Sad);
    assert_eq!(report.summary(), "Faces: 3\n[sad, ?, neutral]");
}

#[test]
fn next_frame_is_independent_of_a_failed_one() {
    let classifier = Scripted::new(vec![
        Err(EmotionPipelineError::ModelUnavailable("warming up".to_string())),
        Err(EmotionPipelineError::ModelUnavailable("warming up".to_string())),
        Err(EmotionPipelineError::ModelUnavailable("warming up".to_string())),
        Ok(EmotionLabel::Surprise),
        Ok(EmotionLabel::Contempt),
        Ok(EmotionLabel::Contempt),
    ]);
    let (display, _rx) = broadcast::channel(4);
    let mut analyzer = FrameAnalyzer::new(
        pipeline(classifier),
        Announcer::new(PhraseBook::turkish(), SlowSpeaker::default()),
        display,
    );

    let frame = crowd_frame();
    assert!(analyzer.analyze(&frame).is_err());
    let analysis = analyzer.analyze(&frame).unwrap();
    assert_eq!(analysis.report.majority, EmotionLabel::Contempt);
    assert_eq!(
        analysis.announcement,
        Announcement::Spoken("küçümseyici".to_string())
    );
}
