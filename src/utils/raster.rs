//! Low-level raster primitives shared by the pipeline stages

use crate::error::{EditError, Result};
use image::{GrayImage, RgbImage};

/// Gaussian-blur a single-channel buffer of `width x height` pixels.
///
/// The output buffer has the same length as the input; pass it through
/// [`collapse_channels`] before trusting the length invariant when the
/// raster backend is swapped out.
///
/// # Errors
/// - Buffer length does not cover the raster
pub fn blur_single_channel(data: Vec<u8>, width: u32, height: u32, sigma: f32) -> Result<Vec<u8>> {
    let area = width as usize * height as usize;
    let len = data.len();
    let gray = GrayImage::from_raw(width, height, data).ok_or(EditError::AlphaCropSizeMismatch {
        len,
        area,
    })?;
    let blurred = image::imageops::blur(&gray, sigma);
    Ok(blurred.into_raw())
}

/// Normalize a buffer that should hold exactly `area` single-channel
/// samples.
///
/// Some raster backends return 2, 3, or 4 interleaved channels from a
/// single-channel operation. When the length is an exact small multiple
/// of the area, channel 0 is extracted; any other mismatch is an
/// invariant violation.
///
/// # Errors
/// - `EditError::AlphaCropSizeMismatch` when the length is neither the
///   area nor a 2x/3x/4x interleaving of it
pub fn collapse_channels(buf: Vec<u8>, area: usize) -> Result<Vec<u8>> {
    if buf.len() == area {
        return Ok(buf);
    }
    if area > 0 && buf.len() % area == 0 {
        let channels = buf.len() / area;
        if (2..=4).contains(&channels) {
            return Ok(buf.into_iter().step_by(channels).collect());
        }
    }
    Err(EditError::AlphaCropSizeMismatch {
        len: buf.len(),
        area,
    })
}

/// Encode an 8-bit sRGB raster as lossless PNG bytes
///
/// # Errors
/// - PNG encoder failures from the image backend
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgb8(image.clone()).write_to(&mut cursor, image::ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_preserves_length() {
        let data = vec![0u8; 64];
        let blurred = blur_single_channel(data, 8, 8, 2.0).unwrap();
        assert_eq!(blurred.len(), 64);
    }

    #[test]
    fn test_blur_rejects_short_buffer() {
        let err = blur_single_channel(vec![0u8; 10], 8, 8, 1.0).unwrap_err();
        assert!(matches!(err, EditError::AlphaCropSizeMismatch { .. }));
    }

    #[test]
    fn test_collapse_channels_identity() {
        let buf = vec![1, 2, 3, 4];
        assert_eq!(collapse_channels(buf.clone(), 4).unwrap(), buf);
    }

    #[test]
    fn test_collapse_channels_extracts_channel_zero() {
        // 3-channel interleaving of a 2-sample buffer
        let buf = vec![10, 0, 0, 20, 0, 0];
        assert_eq!(collapse_channels(buf, 2).unwrap(), vec![10, 20]);

        // 4-channel interleaving
        let buf = vec![5, 1, 1, 1, 9, 2, 2, 2];
        assert_eq!(collapse_channels(buf, 2).unwrap(), vec![5, 9]);
    }

    #[test]
    fn test_collapse_channels_rejects_garbage_lengths() {
        assert!(matches!(
            collapse_channels(vec![0; 7], 2),
            Err(EditError::AlphaCropSizeMismatch { len: 7, area: 2 })
        ));
        // 5 channels is not a recoverable interleaving
        assert!(collapse_channels(vec![0; 10], 2).is_err());
    }

    #[test]
    fn test_encode_png_round_trip() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(1, 1, image::Rgb([200, 100, 50]));
        let png = encode_png(&img).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1), &image::Rgb([200, 100, 50]));
    }
}
