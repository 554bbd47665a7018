//! Mock model adapter for testing and debugging
//!
//! Returns a deterministic solid-color PNG regardless of the prompt, so
//! the raster pipeline can be exercised hermetically.

use crate::backends::PatchModel;
use crate::error::Result;
use crate::utils::raster;
use async_trait::async_trait;
use image::RgbImage;

/// Deterministic stand-in for the external model
#[derive(Debug, Clone)]
pub struct MockPatchModel {
    color: [u8; 3],
    width: u32,
    height: u32,
}

impl MockPatchModel {
    /// Create a mock returning a 64x64 mid-gray patch
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: [128, 128, 128],
            width: 64,
            height: 64,
        }
    }

    /// Set the returned patch color
    #[must_use]
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Set the returned patch dimensions
    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Default for MockPatchModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatchModel for MockPatchModel {
    async fn generate_from_patch(&self, _prompt: &str, _patch_png: &[u8]) -> Result<Vec<u8>> {
        let patch = RgbImage::from_pixel(self.width, self.height, image::Rgb(self.color));
        raster::encode_png(&patch)
    }
}
