//! Shared raster helpers used across pipeline stages

pub mod raster;

pub use raster::{blur_single_channel, collapse_channels, encode_png};
