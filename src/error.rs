//! Error types for mask-guided edit operations

use std::time::Duration;
use thiserror::Error;

/// Result type alias for edit pipeline operations
pub type Result<T> = std::result::Result<T, EditError>;

/// Comprehensive error types for the edit pipeline and its collaborators
#[derive(Error, Debug)]
pub enum EditError {
    /// Caller omitted the prompt or sent an empty one
    #[error("prompt must not be empty")]
    PromptRequired,

    /// Request field outside its valid range
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),

    /// Stored-file name outside the allowed pattern
    #[error("file name not allowed: {0}")]
    BadFileName(String),

    /// Base image absent from storage
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Base image exceeds the configured byte budget
    #[error("input of {actual} bytes exceeds budget of {limit} bytes")]
    PayloadTooLarge { actual: u64, limit: u64 },

    /// Mask data-URL could not be parsed or base64-decoded
    #[error("malformed data URL")]
    MalformedDataUrl,

    /// Mask bytes could not be decoded as an image
    #[error("failed to decode mask: {0}")]
    MaskDecode(String),

    /// Mask decoded but its metadata is unusable (zero dimensions)
    #[error("unusable mask: {0}")]
    MaskMeta(String),

    /// Decoded edit alpha selects no pixels
    #[error("mask selects no pixels")]
    EmptyMask,

    /// Base image decoded but its metadata is unusable
    #[error("unusable base image: {0}")]
    ImageMeta(String),

    /// Model response carried no decodable image
    #[error("model response contained no image")]
    NoImageInResponse,

    /// Model endpoint returned a non-success HTTP status
    #[error("model endpoint returned HTTP {0}")]
    ModelHttp(u16),

    /// Model endpoint rejected the API key
    #[error("model rejected the API key")]
    InvalidCredential,

    /// Model endpoint rate-limited the request
    #[error("model rate-limited the request")]
    RateLimited,

    /// Model call exceeded the configured deadline
    #[error("model call exceeded {0:?}")]
    ModelTimeout(Duration),

    /// Feathered alpha crop came back with a length that cannot be
    /// normalized to the bbox area. A pipeline bug, not a user error.
    #[error("feathered alpha crop has length {len}, expected area {area}")]
    AlphaCropSizeMismatch { len: usize, area: usize },

    /// Edit alpha handed to the compositor does not cover the image
    #[error("edit alpha has length {len}, expected image area {area}")]
    AlphaSizeMismatch { len: usize, area: usize },

    /// Invalid configuration or parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors from storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raster encode/decode errors from the image backend
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Transport-level errors from the model HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl EditError {
    /// Create a new invalid payload error
    pub fn invalid_payload<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new mask metadata error
    pub fn mask_meta<S: Into<String>>(msg: S) -> Self {
        Self::MaskMeta(msg.into())
    }

    /// Create a new base image metadata error
    pub fn image_meta<S: Into<String>>(msg: S) -> Self {
        Self::ImageMeta(msg.into())
    }

    /// The stable wire tag for this error, surfaced to API clients
    pub fn tag(&self) -> String {
        match self {
            Self::PromptRequired => "prompt_required".to_string(),
            Self::InvalidPayload(_) => "invalid_payload".to_string(),
            Self::BadFileName(_) => "bad_file_name".to_string(),
            Self::FileNotFound(_) => "file_not_found".to_string(),
            Self::PayloadTooLarge { .. } => "payload_too_large".to_string(),
            Self::MalformedDataUrl => "malformed_data_url".to_string(),
            Self::MaskDecode(_) | Self::MaskMeta(_) => "mask_meta_failed".to_string(),
            Self::EmptyMask => "empty_mask".to_string(),
            Self::ImageMeta(_) => "image_meta_failed".to_string(),
            Self::NoImageInResponse => "no_image_in_response".to_string(),
            Self::ModelHttp(code) => format!("openrouter_http_{}", code),
            Self::InvalidCredential => "invalid_openrouter_api_key".to_string(),
            Self::RateLimited => "rate_limited".to_string(),
            Self::ModelTimeout(_) => "model_timeout".to_string(),
            Self::AlphaCropSizeMismatch { .. } => "alpha_crop_size_mismatch".to_string(),
            Self::AlphaSizeMismatch { .. } => "alpha_size_mismatch".to_string(),
            Self::InvalidConfig(_) => "invalid_config".to_string(),
            Self::Io(_) | Self::Image(_) | Self::Network(_) => "unknown".to_string(),
        }
    }

    /// The HTTP status a transport layer should map this error to
    pub fn http_status(&self) -> u16 {
        match self {
            Self::PromptRequired
            | Self::InvalidPayload(_)
            | Self::BadFileName(_)
            | Self::MalformedDataUrl
            | Self::MaskDecode(_)
            | Self::MaskMeta(_)
            | Self::EmptyMask
            | Self::ImageMeta(_) => 400,
            Self::InvalidCredential => 401,
            Self::FileNotFound(_) => 404,
            Self::PayloadTooLarge { .. } => 413,
            Self::RateLimited => 429,
            Self::ModelHttp(code) => *code,
            Self::ModelTimeout(_) => 504,
            Self::NoImageInResponse => 502,
            Self::AlphaCropSizeMismatch { .. }
            | Self::AlphaSizeMismatch { .. }
            | Self::InvalidConfig(_)
            | Self::Io(_)
            | Self::Image(_)
            | Self::Network(_) => 500,
        }
    }
}

/// Pipeline stage identifiers, surfaced alongside errors so callers can
/// name the point of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request field validation
    Parse,
    /// Reading and decoding the stored base image
    ReadBase,
    /// Mask data-URL parsing and edit-alpha extraction
    ParseMask,
    /// Tight bbox extraction and padding
    MaskToBbox,
    /// Mask-space to image-space projection
    AlignMaskToImage,
    /// Cropping and encoding the model patch
    MakePatch,
    /// The external model call
    Model,
    /// Decoding the edited patch and alpha coverage checks
    CompositePrecheck,
    /// Color matching, feathering, and the strict composite
    Composite,
    /// Persisting or encoding the result
    SaveOrReturn,
}

impl Stage {
    /// The stable wire tag for this stage
    pub fn tag(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::ReadBase => "read_base",
            Self::ParseMask => "parse_mask",
            Self::MaskToBbox => "mask_to_bbox",
            Self::AlignMaskToImage => "align_mask_to_image",
            Self::MakePatch => "make_patch",
            Self::Model => "openrouter",
            Self::CompositePrecheck => "composite_precheck",
            Self::Composite => "composite",
            Self::SaveOrReturn => "save_or_return",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// An [`EditError`] annotated with the pipeline stage that raised it
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct StageError {
    /// The stage that failed
    pub stage: Stage,
    /// The underlying error
    #[source]
    pub source: EditError,
}

impl StageError {
    /// Wrap an error with its originating stage
    pub fn new(stage: Stage, source: EditError) -> Self {
        Self { stage, source }
    }
}

/// Adapter for `map_err` that tags errors with their stage
pub(crate) fn at(stage: Stage) -> impl FnOnce(EditError) -> StageError {
    move |source| StageError::new(stage, source)
}
