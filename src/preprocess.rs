// Resizing and tensor packing for classifier input

use crate::error::{EmotionPipelineError, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of interleaved channels per pixel (red, green, blue)
pub const CHANNELS: usize = 3;

/// Resampling filter used when scaling a face crop to the model input size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull_rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        })
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" => Ok(ResizeFilter::Triangle),
            "catmull_rom" | "catmullrom" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!(
                "invalid resize filter '{other}'; expected nearest, triangle, catmull_rom, gaussian or lanczos3"
            )),
        }
    }
}

/// Scales `image` to exactly `width` x `height`
pub fn resize(image: &RgbImage, width: u32, height: u32, filter: ResizeFilter) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, filter.into())
}

/// Fixed input shape of the classifier (height x width x channels, batch of one)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorShape {
    pub width: u32,
    pub height: u32,
}

impl TensorShape {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Number of values a packed image of this shape holds
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset of channel `channel` of pixel (`x`, `y`)
    pub fn index(&self, x: u32, y: u32, channel: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS + channel
    }
}

impl Default for TensorShape {
    fn default() -> Self {
        Self::square(224)
    }
}

/// Row-major, channel-interleaved (NHWC) float buffer
#[derive(Clone, Debug, PartialEq)]
pub struct TensorBuffer {
    shape: TensorShape,
    data: Vec<f32>,
}

impl TensorBuffer {
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of `channel` at pixel (`x`, `y`)
    pub fn value(&self, x: u32, y: u32, channel: usize) -> Option<f32> {
        if x >= self.shape.width || y >= self.shape.height || channel >= CHANNELS {
            return None;
        }
        self.data.get(self.shape.index(x, y, channel)).copied()
    }

    /// Consumes the buffer into a `[1, height, width, 3]` array
    pub fn into_array(self) -> Result<Array4<f32>> {
        let dims = (
            1,
            self.shape.height as usize,
            self.shape.width as usize,
            CHANNELS,
        );
        Array4::from_shape_vec(dims, self.data).map_err(|e| {
            EmotionPipelineError::InvalidInput(format!("Failed to shape tensor buffer: {e}"))
        })
    }
}

/// Packs fixed-size RGB images into classifier input buffers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TensorPacker {
    shape: TensorShape,
    scale: f32,
}

impl TensorPacker {
    /// `scale` multiplies every raw channel value; 1.0 keeps the [0, 255] range
    pub fn new(shape: TensorShape, scale: f32) -> Self {
        Self { shape, scale }
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Emits rows top to bottom, columns left to right, then red, green, blue
    pub fn pack(&self, image: &RgbImage) -> Result<TensorBuffer> {
        let (width, height) = image.dimensions();
        if width != self.shape.width || height != self.shape.height {
            return Err(EmotionPipelineError::DimensionMismatch {
                expected_width: self.shape.width,
                expected_height: self.shape.height,
                width,
                height,
            });
        }

        // pixels() stops at width * height even when the backing buffer is longer
        let data: Vec<f32> = image
            .pixels()
            .flat_map(|pixel| pixel.0)
            .map(|value| value as f32 * self.scale)
            .collect();

        Ok(TensorBuffer {
            shape: self.shape,
            data,
        })
    }
}

impl Default for TensorPacker {
    fn default() -> Self {
        Self::new(TensorShape::default(), 1.0)
    }
}
