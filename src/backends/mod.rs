//! Model adapter implementations
//!
//! The pipeline only assumes the [`PatchModel`] contract: prompt plus
//! patch PNG in, edited patch bytes out. The OpenRouter adapter is the
//! production implementation; the mock adapter serves tests and
//! debugging without network access.

pub mod mock;
pub mod openrouter;

use crate::error::Result;
use async_trait::async_trait;

pub use mock::MockPatchModel;
pub use openrouter::OpenRouterModel;

/// Contract for the external generative image model
///
/// Implementations must not retry; transient-failure policy belongs to
/// the caller.
#[async_trait]
pub trait PatchModel: Send + Sync {
    /// Produce an edited version of the patch restricted to the prompt
    ///
    /// # Errors
    /// - `EditError::InvalidCredential` when the endpoint rejects the key
    /// - `EditError::RateLimited` when the endpoint throttles
    /// - `EditError::ModelHttp` for other upstream failures
    /// - `EditError::NoImageInResponse` when no image can be extracted
    async fn generate_from_patch(&self, prompt: &str, patch_png: &[u8]) -> Result<Vec<u8>>;
}
