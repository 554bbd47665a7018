//! Mask decoding: arbitrary mask rasters into a canonical edit alpha
//!
//! Two mask conventions arrive from painting frontends. A canvas-style
//! PNG paints the edit region white on black; an RGBA export paints the
//! edit region transparent on an opaque ground. Both are folded into a
//! single-channel edit alpha where 255 means "edit this pixel".

use crate::error::{EditError, Result};
use crate::types::{EditAlpha, MaskSpace};
use crate::utils::raster;
use image::DynamicImage;
use log::debug;

/// Luma above this value counts as painted in the bright-means-edit
/// fallback
const LUMA_EDIT_THRESHOLD: u8 = 200;

/// Binarization cut applied after the soft-dilation blur
const DILATE_BINARIZE_AT: u8 = 128;

/// Decode mask bytes into a raster, rejecting unusable metadata
///
/// # Errors
/// - `EditError::MaskDecode` for undecodable bytes
/// - `EditError::MaskMeta` for zero-dimension rasters
pub fn decode_mask(bytes: &[u8]) -> Result<DynamicImage> {
    let mask = image::load_from_memory(bytes).map_err(|e| EditError::MaskDecode(e.to_string()))?;
    if mask.width() == 0 || mask.height() == 0 {
        return Err(EditError::mask_meta("mask has zero dimensions"));
    }
    Ok(mask)
}

/// Produce the canonical edit alpha from a decoded mask
///
/// When the mask carries an alpha channel and its inversion selects at
/// least one pixel, transparent-means-edit wins: `out = 255 - alpha`.
/// Otherwise the mask is treated as a luminance painting and
/// thresholded: bright pixels become 255, the rest 0. A fully-opaque
/// mask with no bright pixels yields an all-zero alpha; rejecting that
/// is the region extractor's job.
pub fn edit_alpha_from_mask(mask: &DynamicImage) -> Result<EditAlpha<MaskSpace>> {
    let (width, height) = (mask.width(), mask.height());

    if mask.color().has_alpha() {
        let rgba = mask.to_rgba8();
        let inverted: Vec<u8> = rgba.pixels().map(|p| 255 - p[3]).collect();
        if inverted.iter().any(|&a| a > 0) {
            debug!(
                "mask {}x{}: transparent-means-edit convention",
                width, height
            );
            return EditAlpha::new(inverted, width, height);
        }
    }

    debug!("mask {}x{}: bright-means-edit fallback", width, height);
    let luma = mask.to_luma8();
    let thresholded: Vec<u8> = luma
        .pixels()
        .map(|p| if p[0] > LUMA_EDIT_THRESHOLD { 255 } else { 0 })
        .collect();
    EditAlpha::new(thresholded, width, height)
}

/// Soft-dilate the edit alpha by one pixel: Gaussian blur of sigma 1
/// followed by binarization at 128. Compensates for anti-aliasing on
/// brush edges.
///
/// # Errors
/// - Invariant failures from the blur normalization
pub fn soft_dilate(alpha: EditAlpha<MaskSpace>) -> Result<EditAlpha<MaskSpace>> {
    let (width, height) = alpha.dimensions();
    let area = width as usize * height as usize;

    let blurred = raster::blur_single_channel(alpha.into_data(), width, height, 1.0)?;
    let blurred = raster::collapse_channels(blurred, area)?;
    let binarized: Vec<u8> = blurred
        .into_iter()
        .map(|a| if a >= DILATE_BINARIZE_AT { 255 } else { 0 })
        .collect();
    EditAlpha::new(binarized, width, height)
}
