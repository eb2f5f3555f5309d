// Frame analysis loop: latest-frame delivery, display updates and announcements

use crate::announce::{Announcement, Announcer, Speaker};
use crate::emotion::Classifier;
use crate::error::Result;
use crate::models::{FaceOutcome, Frame, FrameReport};
use crate::pipeline::EmotionPipeline;
use image::RgbImage;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

/// Receiving half of the frame hand-off; only the newest frame is ever visible
pub type FrameReceiver = watch::Receiver<Option<Arc<Frame>>>;

/// Sending half of the frame hand-off
///
/// Submitting a frame replaces any frame the analyzer has not picked up yet.
#[derive(Debug)]
pub struct LatestFrameSender {
    inner: watch::Sender<Option<Arc<Frame>>>,
}

impl LatestFrameSender {
    pub fn submit(&self, frame: Frame) {
        self.inner.send_replace(Some(Arc::new(frame)));
    }
}

/// Creates the keep-only-latest frame channel
pub fn latest_frame_channel() -> (LatestFrameSender, FrameReceiver) {
    let (inner, receiver) = watch::channel(None);
    (LatestFrameSender { inner }, receiver)
}

/// What the display side gets after every analysed frame
#[derive(Clone, Debug)]
pub struct DisplayUpdate {
    /// Last resized face crop of the frame
    pub preview: Option<Arc<RgbImage>>,
    /// One line per face, e.g. `happy %93.5`
    pub face_texts: Vec<String>,
    /// `Faces: <n>` followed by the label list
    pub summary: String,
}

impl DisplayUpdate {
    fn from_report(report: &FrameReport) -> Self {
        Self {
            preview: report.preview.clone().map(Arc::new),
            face_texts: report.faces.iter().map(FaceOutcome::to_string).collect(),
            summary: report.summary(),
        }
    }
}

/// Result of analysing a single frame
#[derive(Clone, Debug)]
pub struct Analysis {
    pub report: FrameReport,
    pub announcement: Announcement,
}

/// Counters reported when the analysis loop ends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    pub analysed: u64,
    pub failed: u64,
    pub degraded: u64,
    pub announced: u64,
    pub suppressed: u64,
}

/// Drives the pipeline for delivered frames and announces each frame's majority
pub struct FrameAnalyzer<C, S> {
    pipeline: EmotionPipeline<C>,
    announcer: Announcer<S>,
    display: broadcast::Sender<DisplayUpdate>,
    interval: Duration,
    stats: AnalyzerStats,
}

impl<C: Classifier, S: Speaker> FrameAnalyzer<C, S> {
    pub fn new(
        pipeline: EmotionPipeline<C>,
        announcer: Announcer<S>,
        display: broadcast::Sender<DisplayUpdate>,
    ) -> Self {
        Self {
            pipeline,
            announcer,
            display,
            interval: Duration::ZERO,
            stats: AnalyzerStats::default(),
        }
    }

    /// Minimum pause between two analysed frames
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    pub fn announcer(&self) -> &Announcer<S> {
        &self.announcer
    }

    /// Analyses one frame and hands the majority label to the announcer
    pub fn analyze(&mut self, frame: &Frame) -> Result<Analysis> {
        let report = match self.pipeline.process_frame(frame) {
            Ok(report) => report,
            Err(e) => {
                self.stats.failed += 1;
                return Err(e);
            }
        };
        self.stats.analysed += 1;

        if report.is_degraded() {
            self.stats.degraded += 1;
            warn!(
                "Frame analysed with failed faces: {}",
                report.summary().replace('\n', " ")
            );
        }

        if self.display.send(DisplayUpdate::from_report(&report)).is_err() {
            debug!("No display receivers for frame update");
        }

        let announcement = self.announcer.announce(report.majority)?;
        match announcement {
            Announcement::Spoken(_) => self.stats.announced += 1,
            Announcement::Suppressed => self.stats.suppressed += 1,
        }

        Ok(Analysis {
            report,
            announcement,
        })
    }

    /// Consumes frames until the sender is dropped.
    ///
    /// A failing frame is logged and skipped; the next frame is analysed
    /// independently.
    pub async fn run(mut self, mut frames: FrameReceiver) -> AnalyzerStats {
        info!("Frame analyzer started");

        while frames.changed().await.is_ok() {
            let frame = frames.borrow_and_update().clone();
            let Some(frame) = frame else {
                continue;
            };

            if let Err(e) = self.analyze(&frame) {
                error!("Frame analysis failed: {}", e);
            }
            // frame released here, before waiting for the next one
            drop(frame);

            if !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
        }

        info!("Frame analyzer stopped: {:?}", self.stats);
        self.stats
    }
}

impl<C, S> FrameAnalyzer<C, S>
where
    C: Classifier + Send + 'static,
    S: Speaker + Send + 'static,
{
    /// Runs the analysis loop on a dedicated thread with its own runtime.
    ///
    /// Inference is blocking, so it stays off the caller's executor.
    pub fn spawn(self, frames: FrameReceiver) -> Result<JoinHandle<AnalyzerStats>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let handle = thread::Builder::new()
            .name("frame-analyzer".to_string())
            .spawn(move || runtime.block_on(self.run(frames)))?;
        Ok(handle)
    }
}
