//! Region extraction: tight bbox of the edit alpha and projection from
//! mask space into image space
//!
//! After [`align_to_image`] every downstream stage operates purely in
//! image space; the alpha raster covers the image exactly and the bbox
//! lies inside it.

use crate::error::{EditError, Result};
use crate::types::{BBox, EditAlpha, ImageSpace, MaskSpace, Space};
use image::GrayImage;
use log::debug;

/// Compute the tight bbox of all alpha pixels > 0
///
/// # Errors
/// - `EditError::EmptyMask` when no pixel is selected
pub fn tight_bbox<S: Space>(alpha: &EditAlpha<S>) -> Result<BBox<S>> {
    let (width, height) = alpha.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any = false;

    for y in 0..height {
        for x in 0..width {
            if alpha.at(x, y) > 0 {
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if !any {
        return Err(EditError::EmptyMask);
    }
    Ok(BBox::from_extents(min_x, min_y, max_x, max_y))
}

/// Project the edit alpha and its bbox from mask space into image space.
///
/// When the mask already matches the image resolution this is a pure
/// re-tag: pixels and coordinates pass through untouched. Otherwise the
/// bbox corners are scaled with rounding (flooring would systematically
/// shrink the edit region) and re-clamped into image bounds, and the
/// alpha raster is resampled stretch-to-fill to the image resolution.
pub fn align_to_image(
    alpha: EditAlpha<MaskSpace>,
    bbox: BBox<MaskSpace>,
    img_w: u32,
    img_h: u32,
) -> Result<(EditAlpha<ImageSpace>, BBox<ImageSpace>)> {
    let (mask_w, mask_h) = alpha.dimensions();

    if (mask_w, mask_h) == (img_w, img_h) {
        return Ok((alpha.retag(), bbox.retag()));
    }

    debug!(
        "aligning mask {}x{} to image {}x{}",
        mask_w, mask_h, img_w, img_h
    );

    let sx = f64::from(img_w) / f64::from(mask_w);
    let sy = f64::from(img_h) / f64::from(mask_h);

    let scaled = scale_bbox(bbox, sx, sy, img_w, img_h);

    let gray = GrayImage::from_raw(mask_w, mask_h, alpha.into_data()).ok_or(
        EditError::AlphaSizeMismatch {
            len: 0,
            area: mask_w as usize * mask_h as usize,
        },
    )?;
    // Stretch-to-fill: the mask covers the whole image by construction,
    // so aspect preservation would be wrong here
    let resampled = image::imageops::resize(&gray, img_w, img_h, image::imageops::FilterType::Triangle);
    let aligned = EditAlpha::new(resampled.into_raw(), img_w, img_h)?;

    Ok((aligned, scaled))
}

/// Scale bbox corners with rounding and re-clamp into image bounds
fn scale_bbox(bbox: BBox<MaskSpace>, sx: f64, sy: f64, img_w: u32, img_h: u32) -> BBox<ImageSpace> {
    let round = |v: f64| -> u32 {
        if v <= 0.0 {
            0
        } else {
            v.round() as u32
        }
    };

    let left = round(f64::from(bbox.left) * sx).min(img_w - 1);
    let top = round(f64::from(bbox.top) * sy).min(img_h - 1);
    let right = round(f64::from(bbox.right()) * sx).clamp(left + 1, img_w);
    let bottom = round(f64::from(bbox.bottom()) * sy).clamp(top + 1, img_h);

    BBox::new(left, top, right - left, bottom - top)
}
