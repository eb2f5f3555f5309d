// Face region extraction

use crate::error::{EmotionPipelineError, Result};
use crate::models::Region;
use image::{imageops, RgbImage};

/// Copies the pixels inside `region` into a new image positioned at the origin.
///
/// No clipping is attempted: a degenerate or out-of-bounds region is rejected
/// with `InvalidRegion`.
pub fn extract(image: &RgbImage, region: Region) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if !region.fits_within(width, height) {
        return Err(EmotionPipelineError::InvalidRegion {
            left: region.left,
            top: region.top,
            right: region.right,
            bottom: region.bottom,
            width,
            height,
        });
    }

    // fits_within guarantees every coordinate is non-negative
    let crop = imageops::crop_imm(
        image,
        region.left as u32,
        region.top as u32,
        region.width() as u32,
        region.height() as u32,
    );
    Ok(crop.to_image())
}
