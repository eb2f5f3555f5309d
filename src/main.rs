use clap::Parser;
use emotion_announcer::analyzer::{latest_frame_channel, DisplayUpdate, FrameAnalyzer};
use emotion_announcer::announce::{Announcer, LogSpeaker};
use emotion_announcer::config::AnalyzerConfig;
use emotion_announcer::emotion::OnnxClassifier;
use emotion_announcer::error::{EmotionPipelineError, Result};
use emotion_announcer::pipeline::EmotionPipeline;
use emotion_announcer::replay::FrameManifest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Announce the majority emotion of recorded frames with detected faces.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON manifest listing frame images and their face regions.
    #[arg(short, long)]
    frames: PathBuf,

    /// Optional analyzer settings JSON; built-in defaults otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the ONNX model path from the settings.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Override the delay between analysed frames, in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Delay between replayed frames, in milliseconds.
    #[arg(long, default_value_t = 33)]
    frame_period_ms: u64,

    /// Directory receiving the resized face crop of every analysed frame.
    #[arg(long)]
    save_crops: Option<PathBuf>,

    /// Log file path.
    #[arg(long, default_value = "emotion_announcer.log")]
    log_file: PathBuf,

    /// Also log to stderr.
    #[arg(long)]
    stderr: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Initializes file logging, optionally mirrored to stderr
fn init_logging(args: &Args) -> Result<()> {
    let log_file = std::fs::File::create(&args.log_file).map_err(EmotionPipelineError::Io)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_filter(args.log_level);

    let stderr_layer = args.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(args.log_level)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

fn load_config(args: &Args) -> Result<AnalyzerConfig> {
    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(model) = &args.model {
        config.model.path = model.clone();
    }
    if let Some(interval) = args.interval_ms {
        config.analysis_interval_ms = interval;
    }
    config.validate()?;
    Ok(config)
}

/// Writes every display update's crop into `dir`
async fn save_crops(mut updates: broadcast::Receiver<DisplayUpdate>, dir: PathBuf) {
    let mut index = 0usize;
    loop {
        match updates.recv().await {
            Ok(update) => {
                info!("{}", update.summary.replace('\n', " "));
                if let Some(preview) = update.preview {
                    let path = dir.join(format!("face_{index:05}.png"));
                    if let Err(e) = preview.save(&path) {
                        error!("Failed to save crop {:?}: {}", path, e);
                    }
                    index += 1;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Display fell behind, skipped {} updates", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = load_config(&args)?;
    let manifest = FrameManifest::load(&args.frames)?;
    info!(
        "Replaying {} frames with model {:?}",
        manifest.len(),
        config.model.path
    );

    let classifier = OnnxClassifier::new(&config.model.path, config.model.intra_threads)?;
    let pipeline = EmotionPipeline::from_config(classifier, &config)?;
    let announcer = Announcer::new(config.phrase_book(), LogSpeaker::new(config.utterance()));

    let (display_sender, display_receiver) = broadcast::channel(16);
    let crop_writer = match &args.save_crops {
        Some(dir) => {
            ensure_dir(dir)?;
            Some(tokio::spawn(save_crops(display_receiver, dir.clone())))
        }
        None => {
            drop(display_receiver);
            None
        }
    };

    let analyzer = FrameAnalyzer::new(pipeline, announcer, display_sender)
        .with_interval(config.analysis_interval());
    let (frame_sender, frame_receiver) = latest_frame_channel();
    let analysis = analyzer.spawn(frame_receiver)?;

    let period = Duration::from_millis(args.frame_period_ms);
    for frame in manifest.frames() {
        match frame {
            Ok(frame) => frame_sender.submit(frame),
            Err(e) => error!("Skipping unreadable frame: {}", e),
        }
        tokio::time::sleep(period).await;
    }
    drop(frame_sender);

    match tokio::task::spawn_blocking(move || analysis.join()).await {
        Ok(Ok(stats)) => info!("Replay finished: {:?}", stats),
        Ok(Err(_)) => error!("Analyzer thread panicked"),
        Err(e) => error!("Failed to join analyzer thread: {}", e),
    }
    if let Some(writer) = crop_writer {
        if let Err(e) = writer.await {
            error!("Crop writer failed: {}", e);
        }
    }

    Ok(())
}
