//! Patch preparation: crop the original at the bbox and encode the PNG
//! handed to the external model

use crate::error::Result;
use crate::types::{BBox, ImageSpace};
use crate::utils::raster;
use image::{DynamicImage, RgbImage};
use log::debug;

/// Crop the original at the bbox, clamp the longest edge, and encode
/// as sRGB PNG.
///
/// Scaling is uniform ("contain"): stretching the crop would mislead
/// the model about the subject's aspect. The crop is never enlarged;
/// the model receives natural size whenever it fits the edge budget.
///
/// # Errors
/// - PNG encoder failures from the image backend
pub fn prepare_patch(
    original: &DynamicImage,
    bbox: BBox<ImageSpace>,
    max_edge: u32,
) -> Result<Vec<u8>> {
    let crop = original
        .crop_imm(bbox.left, bbox.top, bbox.width, bbox.height)
        .to_rgb8();
    let clamped = clamp_longest_edge(crop, max_edge);

    debug!(
        "patch {}x{} from bbox {}x{}+{}+{}",
        clamped.width(),
        clamped.height(),
        bbox.width,
        bbox.height,
        bbox.left,
        bbox.top
    );
    raster::encode_png(&clamped)
}

/// Shrink uniformly so `max(width, height) <= max_edge`; identity when
/// the crop already fits
fn clamp_longest_edge(crop: RgbImage, max_edge: u32) -> RgbImage {
    let (width, height) = crop.dimensions();
    let longest = width.max(height);
    if longest <= max_edge {
        return crop;
    }

    let scale = f64::from(max_edge) / f64::from(longest);
    let new_w = ((f64::from(width) * scale).round() as u32).max(1);
    let new_h = ((f64::from(height) * scale).round() as u32).max(1);
    image::imageops::resize(&crop, new_w, new_h, image::imageops::FilterType::Lanczos3)
}
