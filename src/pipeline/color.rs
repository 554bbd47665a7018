//! Color matching: pull the model patch's mean RGB toward the mean of
//! the original's neighborhood
//!
//! The correction is a diagonal gain only. Cross-channel terms could
//! neutralize casts more precisely but risk hue shifts; the goal is to
//! remove model-introduced drift, not to reauthor color.

use crate::types::{BBox, ImageSpace};
use image::RgbImage;
use log::debug;

/// Guards the gain ratio against division by a black mean
const GAIN_EPSILON: f32 = 1e-3;

/// Mean RGB over all pixels of a raster
///
/// Callers guarantee at least one pixel; a degenerate empty raster
/// yields a black mean.
pub fn mean_rgb(image: &RgbImage) -> [f32; 3] {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return [0.0; 3];
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        sums[0] += u64::from(pixel[0]);
        sums[1] += u64::from(pixel[1]);
        sums[2] += u64::from(pixel[2]);
    }
    [
        sums[0] as f32 / count as f32,
        sums[1] as f32 / count as f32,
        sums[2] as f32 / count as f32,
    ]
}

/// Mean RGB of the ring surrounding the bbox: the rectangle expanded by
/// `ring` pixels, clipped to the image, minus the bbox interior.
///
/// Returns `None` when the clipped ring contributes no pixels, which
/// happens exactly when the bbox covers the whole image. There is no
/// surrounding context to match against in that case, so callers skip
/// the correction rather than matching the patch to the pre-edit pixels
/// it is replacing.
pub fn ring_mean(original: &RgbImage, bbox: BBox<ImageSpace>, ring: u32) -> Option<[f32; 3]> {
    let (img_w, img_h) = original.dimensions();
    let left = bbox.left.saturating_sub(ring);
    let top = bbox.top.saturating_sub(ring);
    let right = (bbox.right() + ring).min(img_w);
    let bottom = (bbox.bottom() + ring).min(img_h);

    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for y in top..bottom {
        for x in left..right {
            let inside_bbox =
                x >= bbox.left && x < bbox.right() && y >= bbox.top && y < bbox.bottom();
            if inside_bbox {
                continue;
            }
            let pixel = original.get_pixel(x, y);
            sums[0] += u64::from(pixel[0]);
            sums[1] += u64::from(pixel[1]);
            sums[2] += u64::from(pixel[2]);
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some([
        sums[0] as f32 / count as f32,
        sums[1] as f32 / count as f32,
        sums[2] as f32 / count as f32,
    ])
}

/// Per-channel gain pulling `src` toward `tgt`, clamped to
/// `[gain_min, gain_max]`
pub fn channel_gains(src: [f32; 3], tgt: [f32; 3], gain_min: f32, gain_max: f32) -> [f32; 3] {
    let mut gains = [1.0f32; 3];
    for c in 0..3 {
        gains[c] = ((tgt[c] + GAIN_EPSILON) / (src[c] + GAIN_EPSILON)).clamp(gain_min, gain_max);
    }
    debug!(
        "color gains r={:.3} g={:.3} b={:.3}",
        gains[0], gains[1], gains[2]
    );
    gains
}

/// Apply a diagonal gain in place, saturating to [0, 255]
pub fn apply_gains(patch: &mut RgbImage, gains: [f32; 3]) {
    for pixel in patch.pixels_mut() {
        for c in 0..3 {
            pixel[c] = (f32::from(pixel[c]) * gains[c]).clamp(0.0, 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_rgb_uniform() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        assert_eq!(mean_rgb(&img), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_mean_rgb_mixed() {
        let mut img = RgbImage::from_pixel(2, 1, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([255, 100, 50]));
        assert_eq!(mean_rgb(&img), [127.5, 50.0, 25.0]);
    }

    #[test]
    fn test_ring_mean_clips_to_image() {
        let img = RgbImage::from_pixel(10, 10, image::Rgb([100, 100, 100]));
        // BBox in the corner: ring extends past the edge and clips
        let mean = ring_mean(&img, BBox::new(0, 0, 2, 2), 8).unwrap();
        assert_eq!(mean, [100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_ring_mean_excludes_bbox_interior() {
        // Dark bbox interior, bright surroundings: only the
        // surroundings contribute to the mean
        let mut img = RgbImage::from_pixel(20, 20, image::Rgb([200, 200, 200]));
        for y in 8..12 {
            for x in 8..12 {
                img.put_pixel(x, y, image::Rgb([0, 0, 0]));
            }
        }
        let mean = ring_mean(&img, BBox::new(8, 8, 4, 4), 8).unwrap();
        assert_eq!(mean, [200.0, 200.0, 200.0]);
    }

    #[test]
    fn test_ring_mean_degenerates_when_bbox_covers_image() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 0]));
        assert_eq!(ring_mean(&img, BBox::new(0, 0, 8, 8), 8), None);
        // A zero-radius ring around a smaller bbox is empty too
        assert!(ring_mean(&img, BBox::new(2, 2, 4, 4), 0).is_none());
        // Any pixel outside the bbox keeps the ring alive
        assert!(ring_mean(&img, BBox::new(0, 0, 8, 7), 8).is_some());
    }

    #[test]
    fn test_channel_gains_clamp() {
        // Near-black source against a bright target saturates at the
        // upper clamp; the reverse saturates at the lower clamp
        let gains = channel_gains([0.0, 128.0, 255.0], [255.0, 128.0, 0.0], 0.6, 1.6);
        assert_eq!(gains[0], 1.6);
        assert!((gains[1] - 1.0).abs() < 1e-4);
        assert_eq!(gains[2], 0.6);
    }

    #[test]
    fn test_channel_gains_always_within_clamp() {
        for src in [0.0f32, 1.0, 64.0, 255.0] {
            for tgt in [0.0f32, 1.0, 64.0, 255.0] {
                let gains = channel_gains([src; 3], [tgt; 3], 0.6, 1.6);
                for g in gains {
                    assert!((0.6..=1.6).contains(&g), "gain {} escaped clamp", g);
                }
            }
        }
    }

    #[test]
    fn test_apply_gains_saturates() {
        let mut img = RgbImage::from_pixel(1, 1, image::Rgb([200, 100, 10]));
        apply_gains(&mut img, [1.6, 1.0, 0.6]);
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([255, 100, 6]));
    }
}
