#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

//! # mask-edit
//!
//! A server-side mask-guided image edit compositor. A caller supplies a
//! stored base image, a user-drawn mask, and a natural-language prompt;
//! the crate computes the editable region from the mask, asks an
//! external generative model for a replacement patch restricted to that
//! region, and strictly composites the result back so that pixels
//! outside the mask are bit-exact unchanged.
//!
//! The core is a deterministic raster pipeline: mask interpretation,
//! bounding-box extraction, patch preparation, color matching, and a
//! feathered alpha composite. HTTP transport and frontend concerns stay
//! outside the crate; the model and storage collaborators are reached
//! through narrow contracts ([`PatchModel`], [`ImageStore`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mask_edit::{
//!     EditConfig, EditRequest, ImageEditProcessor, ImageStore, OpenRouterModel,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EditConfig::builder().max_patch_edge(1536).build()?;
//! let model = Arc::new(OpenRouterModel::new("sk-or-...")?);
//! let store = ImageStore::new("/var/lib/mask-edit");
//! let processor = ImageEditProcessor::new(config, model, store)?;
//!
//! let response = processor
//!     .edit(EditRequest {
//!         filename: "3f2a0c9e-1b7d-4e5f-8a6b-2c4d6e8f0a1b.png".into(),
//!         mask_data_url: "data:image/png;base64,...".into(),
//!         prompt: "replace the sky with a sunset".into(),
//!         feather: None,
//!         padding: None,
//!         save: true,
//!     })
//!     .await?;
//! println!("composited {} base64 bytes", response.image_base64.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Pixels with zero edit alpha are byte-identical between input and
//!   output; the composite path never re-quantizes the base image.
//! - Output dimensions equal input dimensions.
//! - The bbox handed to the model always lies inside the image, with
//!   width and height of at least one pixel.
//! - Per-channel color gains stay inside the configured clamp.
//!
//! ## Coordinate spaces
//!
//! Mask and image resolutions may differ. [`types::EditAlpha`] and
//! [`types::BBox`] are tagged with their space at the type level;
//! [`pipeline::region::align_to_image`] is the single crossing point.

pub mod backends;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod services;
pub mod types;
pub mod utils;

// Public API exports
pub use backends::{MockPatchModel, OpenRouterModel, PatchModel};
pub use config::{EditConfig, EditConfigBuilder, MAX_FEATHER, MAX_PADDING};
pub use error::{EditError, Result, Stage, StageError};
pub use processor::{EditRequest, EditResponse, ImageEditProcessor};
pub use services::{ImageStore, SavedFile, StoreDir};
pub use types::{BBox, EditAlpha, EditOutcome, ImageSpace, MaskSpace};
