//! The deterministic raster pipeline
//!
//! Five CPU-bound stages run strictly top to bottom: mask decoding,
//! region extraction, patch preparation, color matching, and the strict
//! composite. Each stage consumes only the previous stage's outputs
//! plus the invariants carried forward (image dimensions, bbox,
//! full-resolution alpha). The external model call sits between patch
//! preparation and color matching and is the only non-deterministic
//! step.

pub mod color;
pub mod composite;
pub mod mask;
pub mod patch;
pub mod region;
