//! Strict compositing: feathered source-over blend of the edited patch
//! onto the untouched original
//!
//! The invariant this module holds: for every pixel with edit alpha 0,
//! the output byte-equals the input. The blend is
//! `out = patch * a + orig * (1 - a)`; with `a = 0` the original value
//! passes through the arithmetic unchanged, and lossless PNG encoding
//! preserves it on the wire.

use crate::error::{EditError, Result};
use crate::types::{BBox, EditAlpha, ImageSpace};
use crate::utils::raster;
use image::{DynamicImage, RgbImage};
use log::debug;

/// Check the edit alpha covers the composite canvas exactly
///
/// # Errors
/// - `EditError::AlphaSizeMismatch` when it does not; a pipeline bug
pub fn precheck_alpha(alpha: &EditAlpha<ImageSpace>, img_w: u32, img_h: u32) -> Result<()> {
    let area = img_w as usize * img_h as usize;
    if alpha.dimensions() != (img_w, img_h) || alpha.data().len() != area {
        return Err(EditError::AlphaSizeMismatch {
            len: alpha.data().len(),
            area,
        });
    }
    Ok(())
}

/// Composite the color-matched patch onto the original inside the bbox,
/// under a feathered alpha, returning the full canvas.
///
/// Steps: extract the alpha crop at the bbox, feather it, normalize the
/// blurred buffer back to one channel, stretch the patch to the exact
/// bbox, then source-over blend.
pub fn composite_patch(
    original: &DynamicImage,
    alpha: &EditAlpha<ImageSpace>,
    bbox: BBox<ImageSpace>,
    patch: &RgbImage,
    feather: u32,
) -> Result<RgbImage> {
    let mut canvas = original.to_rgb8();
    let (img_w, img_h) = canvas.dimensions();
    precheck_alpha(alpha, img_w, img_h)?;

    let alpha_crop = feathered_alpha_crop(alpha, bbox, feather)?;

    // Stretch-to-fill: patch preparation never letterboxes, so the
    // model's patch covers the whole bbox content
    let patch = if patch.dimensions() == (bbox.width, bbox.height) {
        patch.clone()
    } else {
        image::imageops::resize(
            patch,
            bbox.width,
            bbox.height,
            image::imageops::FilterType::Lanczos3,
        )
    };

    debug!(
        "compositing {}x{} patch at +{}+{} with feather {}",
        bbox.width, bbox.height, bbox.left, bbox.top, feather
    );

    for dy in 0..bbox.height {
        for dx in 0..bbox.width {
            let a = f32::from(alpha_crop[(dy * bbox.width + dx) as usize]) / 255.0;
            if a == 0.0 {
                continue;
            }
            let src = patch.get_pixel(dx, dy);
            let dst = canvas.get_pixel_mut(bbox.left + dx, bbox.top + dy);
            for c in 0..3 {
                let blended = f32::from(src[c]) * a + f32::from(dst[c]) * (1.0 - a);
                dst[c] = blended.clamp(0.0, 255.0).round() as u8;
            }
        }
    }

    Ok(canvas)
}

/// Extract the alpha at the bbox and feather its edge.
///
/// The blur primitive is expected to hand back one channel, but a
/// swapped raster backend may interleave 2-4; the collapse recovers
/// channel 0 and anything else fails as an invariant violation.
fn feathered_alpha_crop(
    alpha: &EditAlpha<ImageSpace>,
    bbox: BBox<ImageSpace>,
    feather: u32,
) -> Result<Vec<u8>> {
    let area = bbox.width as usize * bbox.height as usize;
    let mut crop = Vec::with_capacity(area);
    for y in bbox.top..bbox.bottom() {
        for x in bbox.left..bbox.right() {
            crop.push(alpha.at(x, y));
        }
    }

    if feather == 0 {
        return Ok(crop);
    }

    let blurred = raster::blur_single_channel(crop, bbox.width, bbox.height, feather as f32)?;
    raster::collapse_channels(blurred, area)
}
