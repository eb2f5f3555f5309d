// Replays recorded frames and their face regions from a JSON manifest

use crate::error::{EmotionPipelineError, Result};
use crate::models::{Frame, Region};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One recorded frame: an image file and the faces found in it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    /// Image path, relative to the manifest's directory unless absolute
    pub image: PathBuf,
    #[serde(default)]
    pub faces: Vec<Region>,
}

/// Ordered list of recorded frames
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameManifest {
    pub frames: Vec<FrameEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl FrameManifest {
    /// Reads a manifest; image paths resolve against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            EmotionPipelineError::ManifestLoad(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut manifest: FrameManifest = serde_json::from_str(&contents).map_err(|e| {
            EmotionPipelineError::ManifestLoad(format!("Failed to parse {}: {e}", path.display()))
        })?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("Loaded {} frames from {:?}", manifest.frames.len(), path);
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn resolve(&self, image: &Path) -> PathBuf {
        if image.is_absolute() {
            image.to_path_buf()
        } else {
            self.base_dir.join(image)
        }
    }

    /// Decodes the image of `entry` into a frame
    pub fn load_frame(&self, entry: &FrameEntry) -> Result<Frame> {
        let path = self.resolve(&entry.image);
        let image = image::open(&path)?.to_rgb8();
        Ok(Frame::new(image, entry.faces.clone()))
    }

    /// Decodes frames lazily, in manifest order
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        self.frames.iter().map(move |entry| self.load_frame(entry))
    }
}
